//! Reporter trait for dependency injection
//!
//! Core logic reports progress and status through this trait so it is not
//! coupled to a particular terminal front end.

use emsdk_schema::ItemName;

pub trait Reporter: Send + Sync {
    /// A new phase has started (e.g. "Installing SDK 'sdk-3.1.45-64bit'").
    fn section(&self, title: &str);

    /// Progress of a file download.
    fn downloading(&self, file: &str, current: u64, total: Option<u64>);

    /// An archive is being unpacked.
    fn extracting(&self, archive: &str, dest: &str);

    /// An item has entered the installing state.
    fn installing(&self, name: &ItemName);

    /// An item was left alone, with the reason.
    fn skipped(&self, name: &ItemName, reason: &str);

    /// An item has entered the uninstalling state.
    fn removing(&self, name: &ItemName);

    /// An item operation completed.
    fn done(&self, name: &ItemName, detail: &str);

    fn info(&self, msg: &str);

    fn success(&self, msg: &str);

    fn warning(&self, msg: &str);

    fn error(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, file: &str, current: u64, total: Option<u64>) {
        (**self).downloading(file, current, total);
    }
    fn extracting(&self, archive: &str, dest: &str) {
        (**self).extracting(archive, dest);
    }
    fn installing(&self, name: &ItemName) {
        (**self).installing(name);
    }
    fn skipped(&self, name: &ItemName, reason: &str) {
        (**self).skipped(name, reason);
    }
    fn removing(&self, name: &ItemName) {
        (**self).removing(name);
    }
    fn done(&self, name: &ItemName, detail: &str) {
        (**self).done(name, detail);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// A no-op reporter for silent operations (e.g., probing, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &str, _: &str) {}
    fn installing(&self, _: &ItemName) {}
    fn skipped(&self, _: &ItemName, _: &str) {}
    fn removing(&self, _: &ItemName) {}
    fn done(&self, _: &ItemName, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
