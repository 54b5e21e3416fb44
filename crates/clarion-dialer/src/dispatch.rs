//! Alert dispatch routing (§4.8, supplemented from `original_source`).
//!
//! The original system fronted the Dialer with a Prometheus-webhook HTTP
//! surface that parsed four alert shapes out of Alertmanager JSON. That
//! JSON parsing is out of scope (§1); this module picks up after an
//! already-structured `(phone, message, mode)` triple and routes it to
//! `place_call`/`send_sms`, including the "wait N seconds between SMS and
//! call" behavior for the combined mode.

use std::time::Duration;

use crate::dialer::{Dialer, PlaceCallOutcome};
use crate::sms_client::SmsClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    CallOnly,
    SmsOnly,
    SmsBeforeCall,
    CallAndSms,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DispatchOutcome {
    pub call: Option<PlaceCallOutcome>,
    pub sms_status: Option<u16>,
}

/// Routes one already-parsed alert to the Dialer's `place_call`/`send_sms`.
/// A failed SMS never blocks a parallel call attempt (§4.2).
pub async fn dispatch(
    dialer: &Dialer,
    sms: &SmsClient,
    phone: &str,
    message: &str,
    mode: DispatchMode,
    sms_before_call_wait: Duration,
) -> DispatchOutcome {
    match mode {
        DispatchMode::CallOnly => DispatchOutcome {
            call: place_call_logged(dialer, phone, message).await,
            sms_status: None,
        },
        DispatchMode::SmsOnly => DispatchOutcome {
            call: None,
            sms_status: send_sms_logged(sms, phone, message).await,
        },
        DispatchMode::CallAndSms => {
            let (call, sms_status) = tokio::join!(
                place_call_logged(dialer, phone, message),
                send_sms_logged(sms, phone, message),
            );
            DispatchOutcome { call, sms_status }
        }
        DispatchMode::SmsBeforeCall => {
            let sms_status = send_sms_logged(sms, phone, message).await;
            tokio::time::sleep(sms_before_call_wait).await;
            let call = place_call_logged(dialer, phone, message).await;
            DispatchOutcome { call, sms_status }
        }
    }
}

async fn place_call_logged(dialer: &Dialer, phone: &str, message: &str) -> Option<PlaceCallOutcome> {
    match dialer.place_call(phone, message, false).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::warn!(error = %e, phone, "dispatch: call attempt failed");
            None
        }
    }
}

async fn send_sms_logged(sms: &SmsClient, phone: &str, message: &str) -> Option<u16> {
    match sms.send(phone, message).await {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!(error = %e, phone, "dispatch: sms send failed");
            None
        }
    }
}
