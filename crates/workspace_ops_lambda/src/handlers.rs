pub mod archiver;
pub mod dispatcher;
