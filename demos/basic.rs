use fetch_builder::{ConfigStore, FetchBuilder, Headers, PartialConfig, RequestConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::var("FETCH_DEMO_URL").unwrap_or_else(|_| "https://httpbin.org".to_owned());

    let mut defaults = PartialConfig::from_env().map_err(anyhow::Error::msg)?;
    defaults.headers = Some(Headers::from_pairs([("User-Agent", "fetch-builder-demo")])?);
    ConfigStore::global().set_defaults(defaults);

    let response = FetchBuilder::get(format!("{base_url}/get"))
        .json()
        .max_retries(2)
        .retry_delay_ms(200)
        .request_interceptor(|mut config: RequestConfig| async move {
            config.headers.set("X-Request-Id", "demo-1").map(|()| config)
        })
        .execute()
        .await?;
    println!("GET {} after {} attempt(s)", response.status, response.attempts);
    println!("{:?}", response.data);

    let created = FetchBuilder::post(format!("{base_url}/post"), serde_json::json!({"name": "Kit"}))
        .timeout_ms(5_000)
        .execute()
        .await?;
    println!("POST {}", created.status);

    Ok(())
}
