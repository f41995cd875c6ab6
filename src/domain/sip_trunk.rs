/// Outbound SIP trunk configuration and management
use crate::domain::shared::error::{DomainError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outbound trunk as entered by an operator, before the platform assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTrunk {
    pub name: String,
    /// SIP termination endpoint of the provider
    pub address: String,
    /// Caller numbers the trunk is allowed to present
    pub numbers: Vec<String>,
    pub auth_username: String,
    pub auth_password: String,
}

impl OutboundTrunk {
    /// Create a new outbound trunk
    pub fn new(name: String, address: String) -> Self {
        Self {
            name,
            address,
            numbers: Vec::new(),
            auth_username: String::new(),
            auth_password: String::new(),
        }
    }

    /// Set caller numbers from a comma-separated list
    pub fn with_numbers(mut self, numbers: &str) -> Self {
        self.numbers = parse_numbers(numbers);
        self
    }

    /// Set authentication credentials
    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.auth_username = username;
        self.auth_password = password;
        self
    }

    /// Check the trunk can be submitted
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "trunk address cannot be empty".to_string(),
            ));
        }
        if self.numbers.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one phone number is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated list of numbers into an ordered set
///
/// Whitespace around each entry is trimmed, empty entries and repeats are
/// dropped, first-seen order is kept.
pub fn parse_numbers(input: &str) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for number in input.split(',').map(str::trim) {
        if !number.is_empty() && !numbers.iter().any(|n| n == number) {
            numbers.push(number.to_string());
        }
    }
    numbers
}

/// Outbound trunk as stored by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTrunkInfo {
    pub sip_trunk_id: String,
    pub name: String,
    pub address: String,
    pub numbers: Vec<String>,
    pub auth_username: String,
    pub auth_password: String,
}

impl fmt::Display for OutboundTrunkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sip_trunk_id: {}", self.sip_trunk_id)?;
        writeln!(f, "name: {}", self.name)?;
        writeln!(f, "address: {}", self.address)?;
        writeln!(f, "numbers: [{}]", self.numbers.join(", "))?;
        writeln!(f, "auth_username: {}", self.auth_username)?;
        let password = if self.auth_password.is_empty() {
            ""
        } else {
            "********"
        };
        write!(f, "auth_password: {}", password)
    }
}

/// Repository trait for outbound trunks kept by the platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SipTrunkRepository: Send + Sync {
    /// Create a new outbound trunk
    async fn create_trunk(&self, trunk: OutboundTrunk) -> Result<OutboundTrunkInfo>;

    /// List all outbound trunks
    async fn list_trunks(&self) -> Result<Vec<OutboundTrunkInfo>>;

    /// Delete a trunk by id, returning what the platform removed
    async fn delete_trunk(&self, trunk_id: &str) -> Result<OutboundTrunkInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_trims_entries() {
        assert_eq!(
            parse_numbers("+15551230000, +15551230001"),
            vec!["+15551230000".to_string(), "+15551230001".to_string()]
        );
    }

    #[test]
    fn test_parse_numbers_drops_empty_and_repeats() {
        assert_eq!(
            parse_numbers(" +15551230001 ,, +15551230000,+15551230001 , "),
            vec!["+15551230001".to_string(), "+15551230000".to_string()]
        );
        assert!(parse_numbers("").is_empty());
    }

    #[test]
    fn test_trunk_builder() {
        let trunk = OutboundTrunk::new("Twilio SIP Trunk".to_string(), "example.pstn.twilio.com".to_string())
            .with_numbers("+15551230000")
            .with_credentials("user".to_string(), "secret".to_string());

        assert_eq!(trunk.numbers, vec!["+15551230000".to_string()]);
        assert_eq!(trunk.auth_username, "user");
        assert!(trunk.validate().is_ok());
    }

    #[test]
    fn test_trunk_validation() {
        let no_numbers = OutboundTrunk::new("t".to_string(), "example.com".to_string());
        assert!(no_numbers.validate().is_err());

        let no_address = OutboundTrunk::new("t".to_string(), " ".to_string()).with_numbers("+1555");
        assert!(no_address.validate().is_err());
    }

    #[test]
    fn test_display_masks_password() {
        let info = OutboundTrunkInfo {
            sip_trunk_id: "ST_abc".to_string(),
            name: "Twilio SIP Trunk".to_string(),
            address: "example.pstn.twilio.com".to_string(),
            numbers: vec!["+15551230000".to_string()],
            auth_username: "user".to_string(),
            auth_password: "secret".to_string(),
        };
        let printed = info.to_string();
        assert!(printed.contains("sip_trunk_id: ST_abc"));
        assert!(printed.contains("auth_password: ********"));
        assert!(!printed.contains("secret"));
    }
}
