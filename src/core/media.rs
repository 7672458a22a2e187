//! Photo/video carousel state for the hike detail card and modal

use std::sync::OnceLock;

use regex::Regex;

use super::HikeRecord;

const CLOUDINARY_BASE: &str = "https://res.cloudinary.com/dgdniwosl/image/upload";
const CARD_TRANSFORM: &str = "w_800,h_600,c_limit,q_auto,f_auto";
const MODAL_TRANSFORM: &str = "w_1200,h_1200,c_limit,q_auto,f_auto";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItem {
    /// Cloudinary public id
    Photo { id: String },
    Video { url: String },
}

impl MediaItem {
    /// Images first, then videos
    pub fn from_hike(hike: &HikeRecord) -> Vec<MediaItem> {
        hike.images
            .iter()
            .map(|id| MediaItem::Photo { id: id.clone() })
            .chain(hike.videos.iter().map(|url| MediaItem::Video { url: url.clone() }))
            .collect()
    }

    pub fn card_url(&self) -> Option<String> {
        match self {
            MediaItem::Photo { id } => Some(format!("{}/{}/{}", CLOUDINARY_BASE, CARD_TRANSFORM, id)),
            MediaItem::Video { url } => youtube_id(url).map(youtube_embed_url),
        }
    }

    pub fn modal_url(&self) -> Option<String> {
        match self {
            MediaItem::Photo { id } => Some(format!("{}/{}/{}", CLOUDINARY_BASE, MODAL_TRANSFORM, id)),
            MediaItem::Video { url } => youtube_id(url).map(youtube_embed_url),
        }
    }

    /// Videos without a recognizable id have nothing to show
    pub fn is_playable(&self) -> bool {
        match self {
            MediaItem::Photo { .. } => true,
            MediaItem::Video { url } => youtube_id(url).is_some(),
        }
    }
}

fn youtube_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=|shorts/)([^#&?]*).*")
            .expect("youtube pattern is valid")
    })
}

/// 11-character video id from the usual YouTube URL shapes
pub fn youtube_id(url: &str) -> Option<&str> {
    let id = youtube_regex().captures(url)?.get(2)?.as_str();
    (id.len() == 11).then_some(id)
}

pub fn youtube_embed_url(id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{}?autoplay=1&controls=1&rel=0&iv_load_policy=3&showinfo=0",
        id
    )
}

/// Indices of items that get a navigation dot
pub fn dot_indices(items: &[MediaItem]) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_playable())
        .map(|(i, _)| i)
        .collect()
}

/// Wrap-around position over `len` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaCarousel {
    len: usize,
    current: usize,
}

impl MediaCarousel {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Arrows and dots only make sense with more than one item
    pub fn shows_navigation(&self) -> bool {
        self.len > 1
    }

    pub fn next(self) -> Self {
        self.goto(self.current as isize + 1)
    }

    pub fn prev(self) -> Self {
        self.goto(self.current as isize - 1)
    }

    /// Out-of-range targets wrap around either end
    pub fn goto(self, index: isize) -> Self {
        if self.len == 0 {
            return self;
        }
        Self {
            len: self.len,
            current: index.rem_euclid(self.len as isize) as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_youtube_url_forms() {
        let id = "dQw4w9WgXcQ";
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?start=3",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
        ] {
            assert_eq!(youtube_id(url), Some(id), "failed for {}", url);
        }
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(youtube_id("https://vimeo.com/12345"), None);
    }

    #[test]
    fn test_carousel_wraps() {
        let c = MediaCarousel::new(3);
        assert!(c.shows_navigation());
        assert_eq!(c.prev().current(), 2);
        assert_eq!(c.next().next().next().current(), 0);
        assert_eq!(c.goto(7).current(), 1);
        assert_eq!(c.goto(-1).current(), 2);

        let single = MediaCarousel::new(1);
        assert!(!single.shows_navigation());
        assert_eq!(single.next().current(), 0);

        let empty = MediaCarousel::new(0);
        assert_eq!(empty.next(), empty);
    }

    #[test]
    fn test_media_items_and_urls() {
        let mut hike = HikeRecord::new("a", "A", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        hike.images = vec!["trail/pic1".into()];
        hike.videos = vec!["https://youtu.be/dQw4w9WgXcQ".into(), "not a video".into()];

        let items = MediaItem::from_hike(&hike);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0].card_url().unwrap(),
            "https://res.cloudinary.com/dgdniwosl/image/upload/w_800,h_600,c_limit,q_auto,f_auto/trail/pic1"
        );
        assert!(items[0].modal_url().unwrap().contains("w_1200,h_1200"));
        assert!(items[1].card_url().unwrap().starts_with("https://www.youtube.com/embed/dQw4w9WgXcQ?"));
        assert_eq!(dot_indices(&items), vec![0, 1]);
    }
}
