//! Dashboard session and its components
//!
//! Mirrors the watchdog's web page:
//! - Live YouTube / OBS status badges
//! - Editable polling settings with a saving indicator
//! - Countdown to the next check and to the live-mode auto-disable
//! - Status history chart
//!
//! [`session::DashboardSession`] owns all of it; the other modules are the
//! pieces it drives.

pub mod chart;
pub mod countdown;
pub mod editor;
pub mod page;
pub mod session;
pub mod status;
pub mod types;

pub use chart::{ChartData, HistoryChart};
pub use editor::{ConfigEditor, Control, EditError};
pub use page::Page;
pub use session::{DashboardSession, SessionStats, Surface, UserAction};
pub use status::{render_status, StatusClass, StatusView};
pub use types::{ClientEdit, HistoryEntry, ServerState, TriState};
