mod common;
mod offer;
