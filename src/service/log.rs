use colored::Colorize;
use env_logger::{Builder, Env};
use log::{info, Level};
use std::io::Write;
use std::future::{ready, Ready};
use actix_web::{
   dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
   Error,
};
use futures_util::future::LocalBoxFuture;

/// Logs every request line and the status it ended with.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
   S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
   S::Future: 'static,
   B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type InitError = ();
   type Transform = LoggerMiddlewareService<S>;
   type Future = Ready<Result<Self::Transform, Self::InitError>>;

   fn new_transform(&self, service: S) -> Self::Future {
      ready(Ok(LoggerMiddlewareService { service }))
   }
}

pub struct LoggerMiddlewareService<S> {
   service: S
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
   type Response = ServiceResponse<B>;
   type Error = Error;
   type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

   forward_ready!(service);

   fn call(&self, req: ServiceRequest) -> Self::Future {
      let method = req.method().clone();
      let path = req.path().to_string();
      let fut = self.service.call(req);

      Box::pin(async move {
         let res = fut.await?;
         info!("{} {} -> {}", method, path, res.status());
         Ok(res)
      })
   }
}

pub fn init_logger() {
   Builder::from_env(Env::default().default_filter_or("info,charity_invites=debug"))
   .format(|buf, record| {
      let level = record.level();
      let label = match level {
         Level::Error => level.as_str().red().bold(),
         Level::Warn => level.as_str().yellow().bold(),
         Level::Info => level.as_str().green().bold(),
         Level::Debug => level.as_str().blue().bold(),
         Level::Trace => level.as_str().magenta().bold(),
      };
      writeln!(buf, "{} {} [{}] {}", buf.timestamp(), label, record.target(), record.args())
   })
   .init()
}
