//! Forge user profile types.

use serde::{Deserialize, Serialize};

/// Body of `GET /userprofile/v1/users/@me`.
///
/// Every field is optional on the wire; absent values decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgeUserProfile {
    pub user_id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub country_code: String,
    pub email_id: String,
    pub status_message: String,
    pub profile_images: ProfileImages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileImages {
    #[serde(rename = "sizeX120")]
    pub size_x120: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserialize_camel_case() {
        let json = r#"{
            "userId": "ABCD1234",
            "userName": "jdoe",
            "firstName": "Jane",
            "lastName": "Doe",
            "countryCode": "US",
            "emailId": "jane@example.com",
            "statusMessage": "building things",
            "profileImages": {
                "sizeX20": "https://images.example.com/20.png",
                "sizeX120": "https://images.example.com/120.png"
            }
        }"#;

        let profile: ForgeUserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.user_id, "ABCD1234");
        assert_eq!(profile.user_name, "jdoe");
        assert_eq!(profile.email_id, "jane@example.com");
        assert_eq!(profile.country_code, "US");
        assert_eq!(
            profile.profile_images.size_x120,
            "https://images.example.com/120.png"
        );
    }

    #[test]
    fn test_profile_missing_fields_default_to_empty() {
        let profile: ForgeUserProfile = serde_json::from_str(r#"{"userId": "1"}"#).unwrap();
        assert_eq!(profile.user_id, "1");
        assert!(profile.first_name.is_empty());
        assert!(profile.profile_images.size_x120.is_empty());
    }
}
