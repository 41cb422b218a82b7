use serde::{Deserialize, Serialize};

use crmsync_db::crm::Properties;

/// A CRM object as returned by `/crm/v3/objects/{type}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSpotObject {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

/// One page of a list walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPage {
    pub results: Vec<HubSpotObject>,
    pub next_after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub results: Vec<HubSpotObject>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging {
    pub next: Option<NextPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextPage {
    pub after: String,
}

impl From<ListResponse> for ObjectPage {
    fn from(resp: ListResponse) -> Self {
        Self {
            results: resp.results,
            next_after: resp
                .paging
                .and_then(|p| p.next)
                .map(|n| n.after)
                .filter(|a| !a.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReadRequest<'a> {
    pub properties: &'a [&'a str],
    pub inputs: Vec<BatchReadInput<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReadInput<'a> {
    pub id: &'a str,
}

impl<'a> BatchReadRequest<'a> {
    pub fn new(ids: &'a [String], properties: &'a [&'a str]) -> Self {
        Self {
            properties,
            inputs: ids.iter().map(|id| BatchReadInput { id }).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchReadResponse {
    #[serde(default)]
    pub results: Vec<HubSpotObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_with_cursor() {
        let json = serde_json::json!({
            "results": [
                {
                    "id": "101",
                    "properties": { "hs_object_id": "101", "firstname": "Ada", "phone": null },
                    "createdAt": "2024-01-15T08:00:00.000Z",
                    "archived": false
                }
            ],
            "paging": { "next": { "after": "102", "link": "https://api.hubapi.com/..." } }
        });

        let page: ObjectPage = serde_json::from_value::<ListResponse>(json).unwrap().into();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, "101");
        assert_eq!(
            page.results[0].properties.get("firstname"),
            Some(&Some("Ada".to_string()))
        );
        assert_eq!(page.results[0].properties.get("phone"), Some(&None));
        assert_eq!(page.next_after.as_deref(), Some("102"));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let json = serde_json::json!({ "results": [] });
        let page: ObjectPage = serde_json::from_value::<ListResponse>(json).unwrap().into();
        assert!(page.results.is_empty());
        assert_eq!(page.next_after, None);
    }

    #[test]
    fn batch_read_request_shape() {
        let ids = vec!["1".to_string(), "2".to_string()];
        let props = ["hs_object_id", "email"];
        let body = serde_json::to_value(BatchReadRequest::new(&ids, &props)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "properties": ["hs_object_id", "email"],
                "inputs": [{ "id": "1" }, { "id": "2" }]
            })
        );
    }
}
