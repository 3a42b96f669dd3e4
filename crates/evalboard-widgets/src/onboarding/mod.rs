#![forbid(unsafe_code)]

//! First-run flows: the welcome survey, product setup, and tenant setup.

pub mod live_capture;
pub mod setup;
pub mod survey;
pub mod tenant;

pub use live_capture::{ADAPTER_VERIFY_CAP, CAPTURE_INTERVAL, LiveCapture, SETUP_CAPTURE_CAP};
pub use setup::{SetupData, SetupEvent, SetupStage, SetupStep, SetupWizard};
pub use survey::{SurveyEvent, SurveyResult, SurveyStep, WelcomeSurvey};
pub use tenant::{
    RequestToken, TenantRequest, TenantRequestKind, TenantResponse, TenantStep, TenantWizard,
    TenantWizardEvent,
};
