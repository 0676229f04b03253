use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::page::{
    animation::{AnimationWindow, Easing},
    preload::FramePathTemplate,
    sampler::SamplerSettings,
};

pub const DEFAULT_API_VERSION: &str = "2023-07";

const PLACEHOLDER_STORE_DOMAIN: &str = "your-store.myshopify.com";
const PLACEHOLDER_ACCESS_TOKEN: &str = "your-storefront-access-token";
const PLACEHOLDER_VARIANT_ID: &str = "46438760612078";

const BUILTIN_VARIANTS: &str = include_str!("variants.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("animation window needs a finite start and a positive length (start {start_offset}, length {length})")]
    InvalidWindow { start_offset: f64, length: f64 },
    #[error("variant {0} needs at least one frame")]
    NoFrames(String),
    #[error("invalid frame path template {template:?}: {reason}")]
    InvalidFrameTemplate {
        template: String,
        reason: &'static str,
    },
    #[error("variant route {0} is declared twice")]
    DuplicateRoute(String),
    #[error("could not parse variant table: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Credentials for the hosted storefront. Built once at startup and handed to
/// the client; nothing mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub store_domain: String,
    pub access_token: String,
    pub variant_id: String,
    pub api_version: String,
    pub direct_cart_only: bool,
}

impl StorefrontConfig {
    pub fn new(store_domain: &str, access_token: &str, variant_id: &str) -> StorefrontConfig {
        StorefrontConfig {
            store_domain: format_store_domain(store_domain),
            access_token: access_token.to_owned(),
            variant_id: variant_id.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            direct_cart_only: false,
        }
    }
}

/// Raw storefront inputs as found in the environment or handed over by the
/// page shell. Empty strings count as missing.
#[derive(Clone, Debug, Default)]
pub struct StorefrontSettings {
    pub store_domain: Option<String>,
    pub access_token: Option<String>,
    pub variant_id: Option<String>,
    pub api_version: Option<String>,
    pub direct_cart_only: Option<bool>,
}

impl StorefrontSettings {
    pub fn from_build_env() -> StorefrontSettings {
        StorefrontSettings {
            store_domain: option_env!("MIRROR_SHOPIFY_STORE_DOMAIN").map(str::to_owned),
            access_token: option_env!("MIRROR_SHOPIFY_STOREFRONT_TOKEN").map(str::to_owned),
            variant_id: option_env!("MIRROR_SHOPIFY_PRODUCT_VARIANT_ID").map(str::to_owned),
            api_version: option_env!("MIRROR_SHOPIFY_API_VERSION").map(str::to_owned),
            direct_cart_only: option_env!("MIRROR_CHECKOUT_DIRECT").map(parse_flag),
        }
    }

    /// Values present in `overrides` win.
    pub fn merge(self, overrides: StorefrontSettings) -> StorefrontSettings {
        StorefrontSettings {
            store_domain: present(overrides.store_domain).or(present(self.store_domain)),
            access_token: present(overrides.access_token).or(present(self.access_token)),
            variant_id: present(overrides.variant_id).or(present(self.variant_id)),
            api_version: present(overrides.api_version).or(present(self.api_version)),
            direct_cart_only: overrides.direct_cart_only.or(self.direct_cart_only),
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if present(self.store_domain.clone()).is_none() {
            missing.push("MIRROR_SHOPIFY_STORE_DOMAIN");
        }
        if present(self.access_token.clone()).is_none() {
            missing.push("MIRROR_SHOPIFY_STOREFRONT_TOKEN");
        }
        if present(self.variant_id.clone()).is_none() {
            missing.push("MIRROR_SHOPIFY_PRODUCT_VARIANT_ID");
        }
        missing
    }

    /// Never fails: anything missing is replaced by a development placeholder
    /// and reported once.
    pub fn resolve(self) -> StorefrontConfig {
        let missing = self.missing();
        if !missing.is_empty() {
            warn!(
                "Missing storefront configuration: {}. Using development placeholders.",
                missing.iter().join(", ")
            );
        }

        let store_domain =
            present(self.store_domain).unwrap_or_else(|| PLACEHOLDER_STORE_DOMAIN.to_owned());
        let access_token =
            present(self.access_token).unwrap_or_else(|| PLACEHOLDER_ACCESS_TOKEN.to_owned());
        let variant_id =
            present(self.variant_id).unwrap_or_else(|| PLACEHOLDER_VARIANT_ID.to_owned());

        let config = StorefrontConfig {
            store_domain: format_store_domain(&store_domain),
            access_token,
            variant_id,
            api_version: present(self.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_owned()),
            direct_cart_only: self.direct_cart_only.unwrap_or(false),
        };
        info!(
            "Storefront configured: domain={} token_length={} variant_id_present={}",
            config.store_domain,
            config.access_token.len(),
            !config.variant_id.is_empty()
        );
        config
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|x| !x.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Reduces whatever the operator typed into a bare storefront host name.
///
/// Full URLs collapse to their host, a stray protocol prefix is dropped, and a
/// bare shop handle gets the `.myshopify.com` suffix. Anything with a dot is
/// already a host (either `*.myshopify.com` or a custom checkout domain).
pub fn format_store_domain(domain: &str) -> String {
    let domain = domain.trim();
    if domain.starts_with("http") {
        if let Some(host) = Url::parse(domain)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
        {
            return host;
        }
    }

    let clean = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);

    if clean.contains('.') {
        clean.to_owned()
    } else {
        format!("{clean}.myshopify.com")
    }
}

pub fn page_password_from_build_env() -> Option<String> {
    present(option_env!("MIRROR_PAGE_PASSWORD").map(str::to_owned))
}

#[derive(Debug, Deserialize)]
struct VariantTable {
    variant: Vec<VariantRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VariantRecord {
    name: String,
    route: String,
    start_offset: f64,
    length: f64,
    total_frames: u32,
    #[serde(default)]
    easing: Easing,
    frame_path: String,
    #[serde(default = "default_eager_frames")]
    eager_frames: u32,
    #[serde(default)]
    preview_limit: f64,
    #[serde(default = "default_min_interval_ms")]
    min_interval_ms: f64,
    #[serde(default = "default_threshold_px")]
    threshold_px: f64,
    #[serde(default = "default_settle_ms")]
    settle_ms: u32,
}

fn default_eager_frames() -> u32 {
    10
}

fn default_min_interval_ms() -> f64 {
    SamplerSettings::default().min_interval_ms
}

fn default_threshold_px() -> f64 {
    SamplerSettings::default().threshold_px
}

fn default_settle_ms() -> u32 {
    150
}

/// Everything that used to differ between the copy-pasted animated pages.
#[derive(Clone, Debug)]
pub struct PageVariant {
    pub name: String,
    pub route: String,
    pub window: AnimationWindow,
    pub total_frames: u32,
    pub easing: Easing,
    pub frames: FramePathTemplate,
    pub eager_frames: u32,
    pub preview_limit: f64,
    pub sampler: SamplerSettings,
    pub settle_ms: u32,
}

impl PageVariant {
    fn from_record(record: VariantRecord) -> Result<PageVariant, ConfigError> {
        if record.total_frames == 0 {
            return Err(ConfigError::NoFrames(record.name));
        }
        Ok(PageVariant {
            window: AnimationWindow::new(record.start_offset, record.length)?,
            frames: FramePathTemplate::parse(&record.frame_path)?,
            eager_frames: record.eager_frames.min(record.total_frames),
            preview_limit: record.preview_limit.max(0.0),
            sampler: SamplerSettings {
                min_interval_ms: record.min_interval_ms.max(0.0),
                threshold_px: record.threshold_px.max(0.0),
            },
            settle_ms: record.settle_ms,
            total_frames: record.total_frames,
            easing: record.easing,
            route: record.route,
            name: record.name,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PageVariants {
    variants: Vec<PageVariant>,
}

impl PageVariants {
    pub fn builtin() -> Result<PageVariants, ConfigError> {
        Self::from_toml(BUILTIN_VARIANTS)
    }

    pub fn from_toml(source: &str) -> Result<PageVariants, ConfigError> {
        let table: VariantTable = toml::from_str(source)?;
        let mut variants: Vec<PageVariant> = Vec::with_capacity(table.variant.len());
        for record in table.variant {
            let variant = PageVariant::from_record(record)?;
            if variants.iter().any(|x| x.route == variant.route) {
                return Err(ConfigError::DuplicateRoute(variant.route));
            }
            variants.push(variant);
        }
        Ok(PageVariants { variants })
    }

    pub fn by_name(&self, name: &str) -> Option<&PageVariant> {
        self.variants.iter().find(|x| x.name == name)
    }

    pub fn by_route(&self, route: &str) -> Option<&PageVariant> {
        self.variants.iter().find(|x| x.route == route)
    }
}

/// Everything the page needs at mount time.
#[derive(Clone, Debug)]
pub struct PageConfig {
    pub storefront: StorefrontConfig,
    pub password: Option<String>,
    pub variants: PageVariants,
}

impl PageConfig {
    pub fn from_build_env(overrides: StorefrontSettings) -> Result<PageConfig, ConfigError> {
        Ok(PageConfig {
            storefront: StorefrontSettings::from_build_env().merge(overrides).resolve(),
            password: page_password_from_build_env(),
            variants: PageVariants::builtin()?,
        })
    }
}
