use serde::Deserialize;
use utoipa::ToSchema;

/// An identifier as clients send it: a JSON integer or a digit string.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            IdValue::Number(n) if *n > 0 => Some(*n),
            IdValue::Number(_) => None,
            IdValue::Text(s) => parse_id_token(s),
        }
    }
}

/// `{"items": "1,2,3"}` body used by the bulk delete endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteItemsRequest {
    pub items: Option<IdValue>,
}

impl DeleteItemsRequest {
    /// Ids from the comma separated list; tokens that are not plain digits are dropped.
    pub fn ids(&self) -> Vec<i64> {
        match &self.items {
            Some(IdValue::Text(raw)) => parse_id_list(raw),
            Some(value) => value.as_id().into_iter().collect(),
            None => Vec::new(),
        }
    }
}

pub fn parse_id_list(raw: &str) -> Vec<i64> {
    let mut ids: Vec<i64> = raw.split(',').filter_map(parse_id_token).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn parse_id_token(token: &str) -> Option<i64> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_digit_tokens() {
        assert_eq!(parse_id_list("1,abc,2"), vec![1, 2]);
        assert_eq!(parse_id_list(" 3 , -4, 5x,,6"), vec![3, 6]);
        assert!(parse_id_list("abc").is_empty());
        assert!(parse_id_list("").is_empty());
    }

    #[test]
    fn id_value_accepts_numbers_and_digit_strings() {
        let from_json = |v: serde_json::Value| serde_json::from_value::<IdValue>(v).unwrap();
        assert_eq!(from_json(serde_json::json!(7)).as_id(), Some(7));
        assert_eq!(from_json(serde_json::json!("12")).as_id(), Some(12));
        assert_eq!(from_json(serde_json::json!("12a")).as_id(), None);
        assert_eq!(from_json(serde_json::json!(0)).as_id(), None);
    }

    #[test]
    fn delete_request_with_single_number() {
        let req: DeleteItemsRequest =
            serde_json::from_value(serde_json::json!({ "items": 9 })).unwrap();
        assert_eq!(req.ids(), vec![9]);

        let req: DeleteItemsRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(req.ids().is_empty());
    }
}
