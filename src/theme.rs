//! Trail palette, category icons and stroke styling

use crate::core::HikeType;

/// One color per hiking year
pub mod colors {
    pub const YEAR_2022: &str = "#3498db"; // blue
    pub const YEAR_2023: &str = "#2ecc71"; // green
    pub const YEAR_2024: &str = "#f1c40f"; // yellow
    pub const YEAR_2025: &str = "#e67e22"; // orange
    pub const YEAR_2026: &str = "#9b59b6"; // purple

    /// Years outside the palette
    pub const DEFAULT_TRAIL: &str = "#7f8c8d";
}

pub fn year_color(year: i32) -> &'static str {
    match year {
        2022 => colors::YEAR_2022,
        2023 => colors::YEAR_2023,
        2024 => colors::YEAR_2024,
        2025 => colors::YEAR_2025,
        2026 => colors::YEAR_2026,
        _ => colors::DEFAULT_TRAIL,
    }
}

pub mod icons {
    use super::HikeType;

    pub const ICON_DIR: &str = "assets/icons";
    pub const SIZE: [u32; 2] = [32, 32];
    /// Tip sits 10px below the image
    pub const ANCHOR: [i32; 2] = [16, 42];
    pub const POPUP_ANCHOR: [i32; 2] = [0, -32];

    pub const CLASS_BASE: &str = "hike-icon";
    pub const CLASS_TRAIL_START: &str = "trail-start-icon";
    pub const CLASS_MULTI_YEAR: &str = "multi-year-icon-style";

    pub fn file_for(hike_type: HikeType) -> &'static str {
        match hike_type {
            HikeType::OvernightTrip => "overnight-trip-icon.png",
            HikeType::DayTrip => "day-trip-icon.png",
            HikeType::DayHike => "day-hike-icon.png",
            HikeType::CarCamping => "car-camping-icon.png",
            HikeType::Backpacking => "backpacking-icon.png",
            HikeType::Viewpoint => "viewpoint-icon.png",
            HikeType::Other => "hiker-icon.png",
        }
    }
}

pub mod strokes {
    pub const PRIMARY_WEIGHT: f64 = 5.0;
    pub const PRIMARY_OPACITY: f64 = 1.0;

    pub const GHOST_BASE_WEIGHT: f64 = 5.0;
    pub const GHOST_WEIGHT_STEP: f64 = 4.0;
    /// Saturates after four repeat visits
    pub const GHOST_MAX_WEIGHT: f64 = 21.0;
    pub const GHOST_OPACITY_START: f64 = 0.25;
    pub const GHOST_OPACITY_STEP: f64 = 0.05;
    pub const GHOST_MIN_OPACITY: f64 = 0.05;
    pub const GHOST_MAX_OPACITY: f64 = 0.2;

    /// Showcase map dots
    pub const HALO_RADIUS: f64 = 6.0;
    pub const DOT_RADIUS: f64 = 3.0;
    pub const HALO_CLASS: &str = "breathing-halo trail-path";
    pub const DOT_CLASS: &str = "trail-path";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_palette() {
        assert_eq!(year_color(2022), "#3498db");
        assert_eq!(year_color(2026), "#9b59b6");
        assert_eq!(year_color(2019), colors::DEFAULT_TRAIL);
    }

    #[test]
    fn test_icon_fallback() {
        assert_eq!(icons::file_for(HikeType::Viewpoint), "viewpoint-icon.png");
        assert_eq!(icons::file_for(HikeType::Other), "hiker-icon.png");
    }
}
