//! Size bucketing for traffic samples.
//!
//! Exact byte counts never leave the process; samples carry a coarse bucket index instead.

use std::fmt::Debug;

const HEADER_THRESHOLDS: [u64; 7] = [1, 1_024, 4_096, 8_192, 16_384, 32_768, 65_536];
const BODY_THRESHOLDS: [u64; 10] = [
    1,
    1_024,
    10_240,
    51_200,
    102_400,
    512_000,
    1_048_576,
    5_242_880,
    10_485_760,
    52_428_800,
];

/// Maps byte counts onto bucket indices.
pub trait SizeBucketer: Debug + Send + Sync {
    /// Bucket for request header bytes.
    fn request_headers(&self, bytes: u64) -> i32;
    /// Bucket for request body bytes.
    fn request_body(&self, bytes: u64) -> i32;
    /// Bucket for response header bytes.
    fn response_headers(&self, bytes: u64) -> i32;
    /// Bucket for response body bytes.
    fn response_body(&self, bytes: u64) -> i32;
}

/// Threshold-based buckets: bucket `i` holds sizes below the `i`-th threshold, bucket 0 is
/// empty payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSizeBucketer;

impl SizeBucketer for DefaultSizeBucketer {
    fn request_headers(&self, bytes: u64) -> i32 {
        bucket(&HEADER_THRESHOLDS, bytes)
    }

    fn request_body(&self, bytes: u64) -> i32 {
        bucket(&BODY_THRESHOLDS, bytes)
    }

    fn response_headers(&self, bytes: u64) -> i32 {
        bucket(&HEADER_THRESHOLDS, bytes)
    }

    fn response_body(&self, bytes: u64) -> i32 {
        bucket(&BODY_THRESHOLDS, bytes)
    }
}

fn bucket(thresholds: &[u64], bytes: u64) -> i32 {
    let index = thresholds.partition_point(|threshold| *threshold <= bytes);
    i32::try_from(index).unwrap_or(i32::MAX)
}
