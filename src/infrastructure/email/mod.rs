pub mod disabled_sender;
pub mod resend_sender;

pub use disabled_sender::DisabledEmailSender;
pub use resend_sender::ResendEmailSender;
