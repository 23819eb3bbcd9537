//! Prometheus metrics for the verification node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format. It receives
//! its counts from the verification service as a [`ServiceEvents`] observer.

use prometheus::{register_int_counter_with_registry, IntCounter, Opts, Registry};

use sv_verification::{ServiceEvents, Transition, VerificationError};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Edits ───────────────────────────────────────────────────────────
    /// Edits that changed at least one field.
    pub edits: IntCounter,
    /// Edits that lowered the record's verification status.
    pub demotions: IntCounter,

    // ── OTP ─────────────────────────────────────────────────────────────
    pub otp_issued: IntCounter,
    /// Codes accepted, marking a mobile number verified.
    pub otp_validated: IntCounter,
    pub otp_mismatched: IntCounter,
    /// Submissions with no unused, unexpired challenge for the current number.
    pub otp_no_valid_challenge: IntCounter,

    // ── Data verification ───────────────────────────────────────────────
    pub data_verifications: IntCounter,
    /// Requests refused because the mobile number is not verified.
    pub precondition_refusals: IntCounter,

    // ── Storage ─────────────────────────────────────────────────────────
    pub persistence_failures: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            edits: counter(&registry, "sv_edits_total", "Edits that changed at least one field")?,
            demotions: counter(
                &registry,
                "sv_demotions_total",
                "Edits that lowered a record's verification status",
            )?,
            otp_issued: counter(&registry, "sv_otp_issued_total", "OTP challenges issued")?,
            otp_validated: counter(
                &registry,
                "sv_otp_validated_total",
                "OTP codes accepted",
            )?,
            otp_mismatched: counter(
                &registry,
                "sv_otp_mismatched_total",
                "OTP codes that did not match the current challenge",
            )?,
            otp_no_valid_challenge: counter(
                &registry,
                "sv_otp_no_valid_challenge_total",
                "OTP submissions without a valid challenge",
            )?,
            data_verifications: counter(
                &registry,
                "sv_data_verifications_total",
                "Records promoted to fully verified",
            )?,
            precondition_refusals: counter(
                &registry,
                "sv_precondition_refusals_total",
                "Data verifications refused for an unverified mobile number",
            )?,
            persistence_failures: counter(
                &registry,
                "sv_persistence_failures_total",
                "Store operations that failed",
            )?,
            registry,
        })
    }
}

impl ServiceEvents for NodeMetrics {
    fn record_edited(&self, transition: &Transition) {
        self.edits.inc();
        if transition.is_change() {
            self.demotions.inc();
        }
    }

    fn otp_issued(&self) {
        self.otp_issued.inc();
    }

    fn mobile_verified(&self) {
        self.otp_validated.inc();
    }

    fn otp_rejected(&self, error: &VerificationError) {
        match error {
            VerificationError::CodeMismatch => self.otp_mismatched.inc(),
            VerificationError::NoValidChallenge(_) => self.otp_no_valid_challenge.inc(),
            _ => {}
        }
    }

    fn data_verified(&self) {
        self.data_verifications.inc();
    }

    fn data_verification_refused(&self) {
        self.precondition_refusals.inc();
    }

    fn persistence_failed(&self) {
        self.persistence_failures.inc();
    }
}
