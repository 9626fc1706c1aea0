use reqwest::blocking::Response;
use scraper::{Html, Selector};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{ServiceError, ServiceResult};

/// `{"data": …, "messages": [{"type": …, "message": …}]}`, the shape every
/// JSON endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub data: Option<T>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn has_message(&self, kind: &str, text: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.kind == kind && m.message.contains(text))
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.kind == "error")
            .map(|m| m.message.as_str())
    }
}

pub fn envelope<T: DeserializeOwned>(response: Response) -> ServiceResult<Envelope<T>> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|err| ServiceError::decode("JSON envelope", err))
}

pub fn xml_to_json(xml: &str) -> ServiceResult<Value> {
    xmltojson::to_json(xml).map_err(|err| ServiceError::decode("XML document", format!("{err:?}")))
}

/// Text content of every element matching `selector`, whitespace-trimmed.
pub fn select_text(html: &str, selector: &str) -> ServiceResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .collect())
}

/// Django-style CSRF token embedded in a form, if the page carries one.
pub fn csrf_token(html: &str) -> ServiceResult<Option<String>> {
    let selector = parse_selector("input[name=csrfmiddlewaretoken]")?;
    let document = Html::parse_document(html);
    let token = document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string);
    Ok(token)
}

fn parse_selector(selector: &str) -> ServiceResult<Selector> {
    Selector::parse(selector).map_err(|err| ServiceError::decode("CSS selector", format!("{err:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_messages() {
        let envelope: Envelope = serde_json::from_value(json!({
            "data": {"id": 4},
            "messages": [
                {"type": "success", "message": "User created"},
                {"type": "error", "message": "Email already registered"}
            ]
        }))
        .unwrap();
        assert_eq!(envelope.data, Some(json!({"id": 4})));
        assert!(envelope.has_message("success", "created"));
        assert_eq!(envelope.errors().collect::<Vec<_>>(), vec!["Email already registered"]);
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert_eq!(envelope.data, None);
        assert!(!envelope.has_message("error", ""));
    }

    #[test]
    fn test_typed_envelope_without_data() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Package {
            id: u32,
        }
        let typed: Envelope<Vec<Package>> = serde_json::from_str(r#"{"data": [{"id": 7}]}"#).unwrap();
        assert_eq!(typed.data, Some(vec![Package { id: 7 }]));
        let empty: Envelope<Package> = serde_json::from_str(r#"{"messages": []}"#).unwrap();
        assert_eq!(empty.data, None);
    }

    #[test]
    fn test_html_helpers() {
        let html = r#"<html><body>
            <form method="post">
              <input type="hidden" name="csrfmiddlewaretoken" value="tok-123">
            </form>
            <ul class="errorlist"><li> Invalid password </li></ul>
        </body></html>"#;
        assert_eq!(csrf_token(html).unwrap().as_deref(), Some("tok-123"));
        assert_eq!(select_text(html, "ul.errorlist li").unwrap(), vec!["Invalid password"]);
        assert_eq!(csrf_token("<p>no form</p>").unwrap(), None);
        assert!(select_text(html, "ul[").is_err());
    }

    #[test]
    fn test_xml_to_json() {
        let value = xml_to_json("<feed><title>intro</title></feed>").unwrap();
        assert_eq!(value["feed"]["title"], json!("intro"));
    }
}
