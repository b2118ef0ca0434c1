use relaygate_provider_core::{Headers, header_set};

pub fn set_bearer(headers: &mut Headers, api_key: &str) {
    header_set(headers, "Authorization", format!("Bearer {api_key}"));
}

pub fn set_accept(headers: &mut Headers, accept: &str) {
    header_set(headers, "Accept", accept);
}

pub fn set_content_type_json(headers: &mut Headers) {
    header_set(headers, "Content-Type", "application/json");
}

pub fn set_header(headers: &mut Headers, name: &str, value: &str) {
    header_set(headers, name, value);
}
