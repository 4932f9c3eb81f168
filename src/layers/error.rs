use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no usable route geometry in feed")]
    NoRoutes,
    #[error(transparent)]
    GtfsError(#[from] crate::gtfs::error::Error),
}
