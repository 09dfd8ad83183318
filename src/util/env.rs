//! Environment configuration.
//!
//! Variables are read from `.env` (if present) and the process environment, then
//! deserialized onto [`Env`] with a small serde deserializer in the style of the
//! [`envy`] crate: variable names are matched case-insensitively against field
//! names and values are parsed into the field's type.
//!
//! [`envy`]: https://github.com/softprops/envy

use std::sync::LazyLock;

use serde::Deserialize;
use serde::de::value::MapDeserializer;
use serde::de::{self, IntoDeserializer};
use thiserror::Error;
use tokio::sync::OnceCell;

static ENV_VARS: LazyLock<OnceCell<Env>> = LazyLock::new(OnceCell::new);

/// Process-wide configuration, loaded on first use.
pub async fn env() -> EnvResult<&'static Env> {
    ENV_VARS.get_or_try_init(|| async { Env::new() }).await
}

#[inline]
fn default_port() -> u16 {
    8080
}

#[inline]
fn default_cors() -> String {
    String::from("*")
}

#[inline]
const fn default_max_top_count() -> i64 {
    100
}

#[inline]
fn default_service_name() -> String {
    String::from("pond-storage")
}

#[inline]
fn default_tracer_name() -> String {
    String::from("pond-storage-tracer")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Env {
    pub database_url: String,
    pub session_secret: String,
    #[serde(default = "default_port")]
    pub server_api_port: u16,
    #[serde(default = "default_cors")]
    pub cors_allow_origins: String,
    #[serde(default = "default_max_top_count")]
    pub max_top_count: i64,
    #[serde(default = "default_service_name")]
    pub api_service_name: String,
    #[serde(default = "default_tracer_name")]
    pub api_tracer_name: String,
    pub otel_exporter_otlp_endpoint: Option<String>,
}

impl Env {
    pub fn new() -> EnvResult<Self> {
        _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<Iter>(vars: Iter) -> EnvResult<Self>
    where
        Iter: IntoIterator<Item = (String, String)>,
    {
        let env = from_iter::<_, Env>(vars)?;

        if env.max_top_count < 1 {
            return Err(EnvErr::Invalid("MAX_TOP_COUNT", env.max_top_count.to_string()));
        }
        if env.session_secret.is_empty() {
            return Err(EnvErr::Invalid("SESSION_SECRET", String::from("<empty>")));
        }

        Ok(env)
    }
}

// ---
//  Deserializer implementation
// ---

struct Val(String, String);

impl<'de> IntoDeserializer<'de, EnvDeserializeError> for Val {
    type Deserializer = Self;
    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! forward_parsed_vals {
    ($($ty:ident => $method:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, EnvDeserializeError>
            where
                V: de::Visitor<'de>
            {
                match self.1.parse::<$ty>() {
                    Ok(val) => val.into_deserializer().$method(visitor),
                    Err(e) => Err(de::Error::custom(format_args!(
                        "{}: while parsing '{}' (provider: {})",
                        e, self.1, self.0
                    )))
                }
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Val {
    type Error = EnvDeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        self.1.into_deserializer().deserialize_any(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: de::Visitor<'de>,
    {
        // an exported-but-empty variable counts as unset
        if self.1.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    forward_parsed_vals! {
        bool => deserialize_bool,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
    }

    serde::forward_to_deserialize_any! {
        i8 i16 u8 f32 f64 char str string unit bytes byte_buf map seq
        unit_struct newtype_struct tuple_struct identifier tuple enum
        ignored_any struct
    }
}

pub fn from_iter<Iter, T>(iter: Iter) -> Result<T, EnvDeserializeError>
where
    T: de::DeserializeOwned,
    Iter: IntoIterator<Item = (String, String)>,
{
    let vars = iter
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), Val(k, v)));

    T::deserialize(MapDeserializer::new(vars))
}

impl de::Error for EnvDeserializeError {
    fn custom<T>(msg: T) -> Self
    where
        T: std::fmt::Display,
    {
        EnvDeserializeError::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        EnvDeserializeError::MissingValue(field.to_uppercase())
    }
}

pub type EnvResult<T> = core::result::Result<T, EnvErr>;

#[derive(Debug, Error)]
pub enum EnvErr {
    #[error(transparent)]
    DeserializationError(#[from] EnvDeserializeError),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Error)]
pub enum EnvDeserializeError {
    #[error("env deserialization error: {0}")]
    Custom(String),

    #[error("missing environment variable {0}")]
    MissingValue(String),
}
