use crate::error::CoreError;

/// Generate a new record id (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Record ids are UUIDs in every workspace schema.
pub fn validate_id(id: &str) -> Result<uuid::Uuid, CoreError> {
    uuid::Uuid::parse_str(id).map_err(|_| CoreError::InvalidId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_validate() {
        let id = generate_id();
        assert!(validate_id(&id).is_ok());
    }

    #[test]
    fn rejects_non_uuid() {
        assert!(matches!(validate_id("abc"), Err(CoreError::InvalidId(_))));
    }
}
