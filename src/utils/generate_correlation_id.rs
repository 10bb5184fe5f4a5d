use uuid::Uuid;

/// Generates the opaque token that ties every reply fragment back to the
/// session that issued the request. Random UUIDs keep tokens unique across
/// processes, so two clients sharing a work queue can never claim each
/// other's replies.
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}
