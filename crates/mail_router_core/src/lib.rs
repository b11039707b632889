pub mod domain;
pub mod ports;

pub use domain::{
    ActionTaken, AuthState, DashboardStats, EmailLogEntry, Identity, Route, Session,
    TemporaryAddress,
};
pub use ports::{
    CredentialStore, DashboardService, IdentityService, Navigator, PortError, PortResult,
    TempEmailService,
};
