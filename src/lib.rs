pub mod cache;
pub mod config;
pub mod dao;
pub mod dialect;
pub mod exception;
pub mod model;
pub mod packet;
pub mod param;
pub mod pathinfo;
pub mod query;
pub mod request;
pub mod router;
pub mod rule;

pub use cache::RegexCache;
pub use config::{Config, DatabaseConfig, RouterConfig};
pub use dao::{Dao, Driver, DriverError, Row};
pub use dialect::Dialect;
pub use exception::Exception;
pub use model::{Model, TableDef};
pub use packet::{Params, RouteOutcome, RoutePacket};
pub use query::{BindParams, Condition, FieldSpec, JoinKind, Operator, Segments};
pub use request::Request;
pub use router::Router;
pub use rule::{CallbackResult, RuleSpec};
