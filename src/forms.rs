//! Browser-side form flows, kept free of any UI toolkit so a front end (or a test) can drive them.

mod notice;
mod signup;
mod unsubscribe;

pub use notice::{Banner, Notice, NoticeKind, BANNER_TIMEOUT};
pub use signup::{FieldSet, SignupFields, SignupForm, SignupOutcome};
pub use unsubscribe::{FormState, Outcome, UnsubscribeForm};
