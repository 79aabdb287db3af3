use std::time::{SystemTime, UNIX_EPOCH};

use resilient_api_client::{ApiClient, ClientOptions, RequestOptions, RequestSpec};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = ClientOptions::from_env()?;
    let base_url = if options.base_url.is_empty() {
        "https://httpbin.org".to_owned()
    } else {
        options.base_url.clone()
    };

    let api = ApiClient::new(options.with_base_url(base_url))?;
    api.add_request_interceptor(|mut request: RequestSpec| {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        if let Ok(value) = millis.to_string().parse() {
            request.headers.insert("x-request-time", value);
        }
        request
    });

    let response = api
        .post("/anything", &json!({"task": "ping"}), RequestOptions::new())
        .await?;
    println!("{} ok={} {:?}", response.status, response.ok, response.data);

    Ok(())
}
