use crate::document::Chain;
use crate::error::{Result, VastError};
use crate::models::*;

/// Collapse a resolved chain into a single VAST document.
///
/// The result is the terminal InLine document with the tracking of every
/// wrapper in the chain merged into each of its InLine ads, so a player only
/// has to handle one document.
pub fn stitch(chain: &Chain) -> Result<Vast> {
    let (inline_document, wrappers) = chain
        .split_last()
        .ok_or_else(|| VastError::Malformed("cannot stitch an empty chain".to_string()))?;

    if !inline_document.is_inline() {
        return Err(VastError::Malformed(format!(
            "chain ends with a wrapper at {}",
            inline_document.uri
        )));
    }

    let mut tracking = WrapperTracking::default();
    for wrapper in wrappers
        .iter()
        .flat_map(|document| document.ads.first())
        .filter_map(|ad| ad.wrapper.as_ref())
    {
        tracking.collect(wrapper);
    }

    let mut vast = inline_document.to_vast();
    for inline in vast.ads.iter_mut().filter_map(|ad| ad.inline.as_mut()) {
        tracking.apply(inline);
    }

    Ok(vast)
}

/// Tracking gathered from the wrappers of a chain, in chain order
#[derive(Default)]
struct WrapperTracking {
    impressions: Vec<Impression>,
    error_urls: Vec<String>,
    tracking_events: Vec<TrackingEvent>,
    click_tracking: Vec<String>,
    custom_click: Vec<String>,
}

impl WrapperTracking {
    fn collect(&mut self, wrapper: &Wrapper) {
        self.impressions.extend(wrapper.impressions.iter().cloned());
        self.error_urls.extend(wrapper.error.iter().cloned());

        for linear in wrapper.creatives.iter().filter_map(|c| c.linear.as_ref()) {
            self.tracking_events.extend(linear.tracking_events.iter().cloned());

            if let Some(video_clicks) = &linear.video_clicks {
                self.click_tracking.extend(video_clicks.click_tracking.iter().cloned());
                self.custom_click.extend(video_clicks.custom_click.iter().cloned());
            }
        }
    }

    fn apply(&self, inline: &mut InLine) {
        inline.impressions.extend(self.impressions.iter().cloned());

        // Only fall back to a wrapper's error URL if the inline has none
        if inline.error.is_none() {
            inline.error = self.error_urls.first().cloned();
        }

        for linear in inline.creatives.iter_mut().filter_map(|c| c.linear.as_mut()) {
            linear.tracking_events.extend(self.tracking_events.iter().cloned());

            if self.click_tracking.is_empty() && self.custom_click.is_empty() {
                continue;
            }
            let video_clicks = linear.video_clicks.get_or_insert_with(VideoClicks::default);
            video_clicks.click_tracking.extend(self.click_tracking.iter().cloned());
            video_clicks.custom_click.extend(self.custom_click.iter().cloned());
        }
    }
}
