use std::{any::Any, future::Future, panic::AssertUnwindSafe};

use futures::FutureExt;

use crate::{error::ServiceFailure, log, service::Phase, ServiceResult};

/// Runs one lifecycle call, turning both its error and any panic into a
/// `ServiceFailure` instead of letting them escape the calling task.
pub(crate) async fn contain<F>(service: &str, phase: Phase, call: F) -> Result<(), ServiceFailure>
where
    F: Future<Output = ServiceResult>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(ServiceFailure::Failed {
            service: service.to_string(),
            phase,
            error,
        }),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!(service, %phase, %message, "service panicked");
            Err(ServiceFailure::Panicked {
                service: service.to_string(),
                phase,
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
