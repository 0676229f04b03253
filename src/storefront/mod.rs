pub mod error;

use log::{debug, error, info, warn};
use serde::{Deserialize, de::DeserializeOwned};

pub use error::{StorefrontError, UserError};

use crate::{
    config::StorefrontConfig,
    net::{HttpRequest, Transport},
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";
const GLOBAL_ID_PREFIX: &str = "gid://";

/// Wraps a numeric variant id in the storefront's global id format.
pub fn variant_global_id(variant_id: &str) -> String {
    if variant_id.contains(GLOBAL_ID_PREFIX) {
        variant_id.to_owned()
    } else {
        format!("gid://shopify/ProductVariant/{variant_id}")
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<D> {
    data: Option<D>,
    errors: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct NodeData {
    node: Option<VariantNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantNode {
    quantity_available: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartCreateData {
    cart_create: Option<CartCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartCreatePayload {
    cart: Option<Cart>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cart {
    checkout_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckoutSource {
    /// `checkoutUrl` of a freshly created cart.
    Api,
    /// Direct cart mode, the API was not consulted.
    Direct,
    /// The API failed; the string describes why.
    Fallback(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutTarget {
    pub url: String,
    pub source: CheckoutSource,
}

pub struct StorefrontClient<T: Transport> {
    config: StorefrontConfig,
    transport: T,
}

impl<T: Transport> StorefrontClient<T> {
    pub fn new(config: StorefrontConfig, transport: T) -> StorefrontClient<T> {
        StorefrontClient { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn graphql_endpoint(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.config.store_domain, self.config.api_version
        )
    }

    pub fn fallback_checkout_url(&self) -> String {
        format!(
            "https://{}/cart/{}:1",
            self.config.store_domain, self.config.variant_id
        )
    }

    pub async fn fetch_available_quantity(&self) -> Result<i64, StorefrontError> {
        let global_id = quote(&variant_global_id(&self.config.variant_id));
        let query = format!(
            "query {{ node(id: {global_id}) {{ ... on ProductVariant {{ quantityAvailable }} }} }}"
        );
        let data: NodeData = self.execute(&query).await?;
        data.node
            .and_then(|node| node.quantity_available)
            .ok_or(StorefrontError::MissingField("node.quantityAvailable"))
    }

    pub async fn create_checkout(&self) -> Result<String, StorefrontError> {
        let global_id = quote(&variant_global_id(&self.config.variant_id));
        let query = format!(
            "mutation {{ cartCreate(input: {{ lines: [{{ quantity: 1, merchandiseId: {global_id} }}] }}) \
             {{ cart {{ checkoutUrl }} userErrors {{ field message }} }} }}"
        );
        let data: CartCreateData = self.execute(&query).await?;
        let payload = data
            .cart_create
            .ok_or(StorefrontError::MissingField("cartCreate"))?;
        if !payload.user_errors.is_empty() {
            return Err(StorefrontError::UserErrors(payload.user_errors));
        }
        payload
            .cart
            .and_then(|cart| cart.checkout_url)
            .filter(|url| !url.is_empty())
            .ok_or(StorefrontError::MissingField("cartCreate.cart.checkoutUrl"))
    }

    /// Where to send the visitor after "Acquire". Never fails: any storefront
    /// error degrades to the direct cart URL.
    pub async fn start_checkout(&self) -> CheckoutTarget {
        if self.config.direct_cart_only {
            info!("Using direct cart URL");
            return CheckoutTarget {
                url: self.fallback_checkout_url(),
                source: CheckoutSource::Direct,
            };
        }

        match self.create_checkout().await {
            Ok(url) => CheckoutTarget {
                url,
                source: CheckoutSource::Api,
            },
            Err(err) => {
                error!("Checkout creation failed, falling back to cart URL: {}", err);
                CheckoutTarget {
                    url: self.fallback_checkout_url(),
                    source: CheckoutSource::Fallback(err.to_string()),
                }
            }
        }
    }

    async fn execute<D: DeserializeOwned>(&self, query: &str) -> Result<D, StorefrontError> {
        let endpoint = self.graphql_endpoint();
        debug!("Storefront request to {}", endpoint);

        let body = serde_json::json!({ "query": query }).to_string();
        let request = HttpRequest::post(&endpoint, body)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_header(ACCESS_TOKEN_HEADER, &self.config.access_token);

        let response = self.transport.fetch(request).await?;
        if !response.is_success() {
            warn!("Storefront responded with status {}", response.status);
            return Err(StorefrontError::Status(response.status));
        }

        let parsed: GraphQlResponse<D> = serde_json::from_slice(&response.body)?;
        if let Some(errors) = parsed.errors {
            return Err(StorefrontError::Api(errors.to_string()));
        }
        parsed.data.ok_or(StorefrontError::MissingField("data"))
    }
}

fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
