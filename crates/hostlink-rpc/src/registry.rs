//! Method registry
//!
//! Built once at startup, then frozen behind an `Arc` by the server. Nothing
//! mutates it while requests are served, so lookups take no lock.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::context::{Application, Context};
use crate::error::{short_type_name, MethodError, RegistryError, RpcError};
use crate::protocol::Params;

/// Declared parameter name that requests context injection
pub const CONTEXT_PARAM: &str = "ctx";

/// Arguments bound to a method's declared parameters.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Required argument
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, RpcError> {
        let value = self.value(name).ok_or_else(|| {
            RpcError::invalid_params(&format!("missing required argument '{name}'."))
        })?;

        T::deserialize(value)
            .map_err(|e| RpcError::invalid_params(&format!("argument '{name}': {e}.")))
    }

    /// Optional argument; absent and null both read as `None`
    pub fn opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, RpcError> {
        match self.value(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(name).map(Some),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Everything a handler receives for one invocation.
pub struct Call<A: Application> {
    /// Present only for methods that declared `ctx`
    pub ctx: Option<Context<A>>,
    pub args: Args,
}

impl<A: Application> Call<A> {
    pub fn context(&self) -> Result<&Context<A>, RpcError> {
        self.ctx.as_ref().ok_or_else(RpcError::internal_error)
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, RpcError> {
        self.args.get(name)
    }

    pub fn opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, RpcError> {
        self.args.opt(name)
    }
}

/// How an invocation failed after the handler was entered.
pub(crate) enum Failure {
    Method(MethodError),
    Encode(serde_json::Error),
}

type BoxedHandler<A> =
    Arc<dyn Fn(Call<A>) -> BoxFuture<'static, Result<Value, Failure>> + Send + Sync>;

pub struct RpcMethod<A: Application> {
    name: String,
    params: Vec<String>,
    accepts_context: bool,
    handler: BoxedHandler<A>,
}

impl<A: Application> RpcMethod<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters, not counting `ctx`
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn accepts_context(&self) -> bool {
        self.accepts_context
    }

    /// Bind request params to the declared parameters.
    ///
    /// Positional values bind in declaration order. Named values are filtered to the
    /// declared names; anything else, including a client-sent `ctx`, is dropped.
    pub fn bind(&self, params: Params) -> Result<Args, RpcError> {
        match params {
            Params::Positional(values) => {
                if values.len() > self.params.len() {
                    return Err(RpcError::invalid_params(&format!(
                        "'{}' takes {} positional arguments but {} were given.",
                        self.name,
                        self.params.len(),
                        values.len()
                    )));
                }

                Ok(Args {
                    values: self.params.iter().cloned().zip(values).collect(),
                })
            }
            Params::Named(mut map) => {
                let values = self
                    .params
                    .iter()
                    .filter_map(|param| map.remove(param).map(|value| (param.clone(), value)))
                    .collect();

                if !map.is_empty() {
                    tracing::debug!(
                        method = %self.name,
                        dropped = ?map.keys().collect::<Vec<_>>(),
                        "Dropping undeclared keyword arguments"
                    );
                }

                Ok(Args { values })
            }
        }
    }

    pub(crate) fn invoke(&self, call: Call<A>) -> BoxFuture<'static, Result<Value, Failure>> {
        (self.handler)(call)
    }
}

pub struct RpcRegistry<A: Application> {
    methods: HashMap<String, RpcMethod<A>>,
}

impl<A: Application> RpcRegistry<A> {
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Register an async handler.
    ///
    /// `name` defaults to the handler's function name; closures have none and must
    /// be named explicitly. Declaring a parameter called `ctx` makes the method
    /// context-aware.
    pub fn register<F, Fut, T>(
        &mut self,
        name: Option<&str>,
        params: &[&str],
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(Call<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, MethodError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => handler_name::<F>()?.to_string(),
        };

        if name.is_empty() || name.starts_with("rpc.") {
            return Err(RegistryError::InvalidName(name));
        }
        if self.methods.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        let accepts_context = params.contains(&CONTEXT_PARAM);
        let params: Vec<String> = params
            .iter()
            .filter(|param| **param != CONTEXT_PARAM)
            .map(|param| param.to_string())
            .collect();

        let boxed: BoxedHandler<A> = Arc::new(move |call: Call<A>| {
            let fut = handler(call);
            async move {
                let value = fut.await.map_err(Failure::Method)?;
                serde_json::to_value(value).map_err(Failure::Encode)
            }
            .boxed()
        });

        tracing::debug!(method = %name, accepts_context, "Registered RPC method");

        self.methods.insert(
            name.clone(),
            RpcMethod {
                name,
                params,
                accepts_context,
                handler: boxed,
            },
        );

        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&RpcMethod<A>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn describe(&self) -> Vec<MethodInfo> {
        let mut methods: Vec<MethodInfo> = self.methods.values().map(MethodInfo::from).collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<A: Application> Default for RpcRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of a function item handler. Closures and fn pointers have none.
fn handler_name<F>() -> Result<&'static str, RegistryError> {
    let full = std::any::type_name::<F>();
    let name = short_type_name::<F>();

    if full.contains("{{closure}}") || full.contains("fn(") || name.is_empty() {
        return Err(RegistryError::Unnamed(full));
    }

    Ok(name)
}

/// Describes one registered method, for introspection endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<String>,
    pub accepts_context: bool,
}

impl<A: Application> From<&RpcMethod<A>> for MethodInfo {
    fn from(method: &RpcMethod<A>) -> Self {
        Self {
            name: method.name.clone(),
            params: method.params.clone(),
            accepts_context: method.accepts_context,
        }
    }
}
