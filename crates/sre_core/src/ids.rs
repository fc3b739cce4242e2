use time::OffsetDateTime;

use crate::error::AppError;
use crate::normalize::timestamps::compact_stamp;

/// `analysis_<YYYYMMDD_HHMMSS>_<8 hex>`: second-resolution UTC time plus 32 random bits.
pub fn generate_analysis_id(now: OffsetDateTime) -> Result<String, AppError> {
    let suffix: [u8; 4] = rand::random();
    Ok(format!("analysis_{}_{}", compact_stamp(now)?, hex::encode(suffix)))
}
