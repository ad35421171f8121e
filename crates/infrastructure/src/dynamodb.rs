use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::Client;
use shared::Config;

#[derive(Debug, Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    /// 設定からクライアントを作成（`dynamodb_endpoint` があれば上書き）
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        tracing::info!(
            table = %config.dynamodb_table,
            region = %config.aws_region,
            endpoint = config.dynamodb_endpoint.as_deref().unwrap_or("default"),
            "DynamoDB client created"
        );

        Self::from_client(Client::new(&aws_config), &config.dynamodb_table)
    }

    pub fn from_client(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}
