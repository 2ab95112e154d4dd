use crate::error::CoreError;

/// Identifier assigned by the store when a row is inserted.
///
/// The service never mints these itself; it only parses them out of request
/// paths and hands them back to the store.
pub type EntityId = i64;

/// Parses the `{id}` segment of a resource path.
///
/// Anything that is not a base-10 signed 64-bit integer is rejected,
/// including one padded with whitespace.
pub fn parse_entity_id(raw: &str) -> Result<EntityId, CoreError> {
    raw.parse::<EntityId>()
        .map_err(|_| CoreError::InvalidId(raw.to_string()))
}
