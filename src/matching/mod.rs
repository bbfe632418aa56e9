pub mod batch;
pub mod blocking;
pub mod grouping;
pub mod memo;
pub mod scorer;
