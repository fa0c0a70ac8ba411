//! Listing envelope shared by every paginated endpoint

use serde::{Deserialize, Serialize};

use crate::domain::page::Page;

/// One page of a listing as returned on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,

    /// Link to the next page; absent or empty on the last page
    #[serde(
        default,
        rename = "odata.nextLink",
        alias = "nextLink",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        Page::new(response.value, response.next_link)
    }
}

impl<T> ListResponse<T> {
    /// Converts every item before building the page
    pub fn into_page_with<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
        Page::new(self.value.into_iter().map(convert).collect(), self.next_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_into_page() {
        let json = r#"{
            "value": [1, 2, 3],
            "odata.nextLink": "https://account.example/jobs?$skiptoken=abc"
        }"#;

        let response: ListResponse<u32> = serde_json::from_str(json).unwrap();
        let page: Page<u32> = response.into();

        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(
            page.next_cursor.unwrap().as_str(),
            "https://account.example/jobs?$skiptoken=abc"
        );
    }

    #[test]
    fn test_list_response_without_link_is_last_page() {
        let response: ListResponse<u32> = serde_json::from_str(r#"{"value": []}"#).unwrap();
        let page: Page<u32> = response.into();
        assert!(page.is_last());
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_management_plane_next_link_alias() {
        let response: ListResponse<u32> =
            serde_json::from_str(r#"{"value": [4], "nextLink": "n"}"#).unwrap();
        assert_eq!(response.next_link.as_deref(), Some("n"));
    }
}
