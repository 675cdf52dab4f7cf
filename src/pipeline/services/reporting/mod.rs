pub mod emitter;

pub use emitter::{
    authority_email, printable_report, sign_notice, AuthorityReportEmitter, RenderRequest,
    Rendered, ReportEmitter,
};
