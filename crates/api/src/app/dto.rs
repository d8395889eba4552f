use serde::Deserialize;

use contacts_core::ContactProfile;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `PUT /_contacts/{id}`: exactly the profile fields, nothing else.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PutContactRequest {
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub org: Option<String>,
    pub email: String,
    pub tel: String,
    pub street_address: String,
    pub locality: String,
    pub region: String,
    pub post_code: String,
    pub country: String,
}

impl From<PutContactRequest> for ContactProfile {
    fn from(req: PutContactRequest) -> Self {
        Self {
            given_name: req.given_name,
            family_name: req.family_name,
            org: req.org,
            email: req.email,
            tel: req.tel,
            street_address: req.street_address,
            locality: req.locality,
            region: req.region,
            post_code: req.post_code,
            country: req.country,
        }
    }
}

/// Query of `PUT /_contacts/{id}`; `rev` is needed to replace an existing contact.
#[derive(Debug, Default, Deserialize)]
pub struct PutContactQuery {
    pub rev: Option<String>,
}

/// Query of `DELETE /_contacts/{id}`; `rev` is required.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveContactQuery {
    pub rev: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "givenName": "A",
            "familyName": "B",
            "email": "a@b.com",
            "tel": "1",
            "streetAddress": "x",
            "locality": "y",
            "region": "z",
            "postCode": "0",
            "country": "US"
        })
    }

    #[test]
    fn accepts_profile_without_org() {
        let req: PutContactRequest = serde_json::from_value(body()).unwrap();
        let profile = ContactProfile::from(req);
        assert_eq!(profile.org, None);
        assert_eq!(profile.post_code, "0");
    }

    #[test]
    fn rejects_unknown_fields() {
        let mut b = body();
        b["owner"] = json!("someone-else");
        let err = serde_json::from_value::<PutContactRequest>(b).unwrap_err();
        assert!(err.to_string().contains("unknown field `owner`"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut b = body();
        b.as_object_mut().unwrap().remove("tel");
        assert!(serde_json::from_value::<PutContactRequest>(b).is_err());
    }
}
