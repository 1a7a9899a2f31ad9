use crate::error::{Result, VastError};
use crate::models::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse a VAST XML string into a Vast struct
pub fn parse_vast(xml: &str) -> Result<Vast> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();

    // Look for the VAST element
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"VAST" => {
                let mut vast = Vast {
                    version: vast_version(e)?,
                    ..Vast::default()
                };
                read_children(&mut reader, b"VAST", |reader, child| {
                    match child.name().as_ref() {
                        b"Ad" => vast.ads.push(parse_ad(reader, child)?),
                        b"Error" => vast.error = Some(read_text(reader)?),
                        _ => return Ok(false),
                    }
                    Ok(true)
                })?;
                return Ok(vast);
            }
            // `<VAST version="3.0"/>` is how ad servers commonly answer "no fill"
            Event::Empty(ref e) if e.name().as_ref() == b"VAST" => {
                return Ok(Vast {
                    version: vast_version(e)?,
                    ..Vast::default()
                });
            }
            Event::Eof => {
                return Err(VastError::Malformed("missing VAST root element".to_string()));
            }
            _ => (),
        }
        buf.clear();
    }
}

fn vast_version(start: &BytesStart) -> Result<String> {
    attribute(start, b"version")
        .filter(|version| !version.is_empty())
        .ok_or_else(|| VastError::MissingField("VAST version".to_string()))
}

fn parse_ad(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Ad> {
    let mut ad = Ad {
        id: attribute(start, b"id"),
        sequence: numeric_attribute(start, b"sequence"),
        conditional_ad: attribute(start, b"conditionalAd").map(|v| v.eq_ignore_ascii_case("true")),
        ..Ad::default()
    };

    read_children(reader, b"Ad", |reader, child| {
        match child.name().as_ref() {
            b"InLine" => ad.inline = Some(parse_inline(reader)?),
            b"Wrapper" => ad.wrapper = Some(parse_wrapper(reader)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(ad)
}

fn parse_inline(reader: &mut Reader<&[u8]>) -> Result<InLine> {
    let mut inline = InLine::default();

    read_children(reader, b"InLine", |reader, child| {
        match child.name().as_ref() {
            b"AdSystem" => inline.ad_system = parse_ad_system(reader, child)?,
            b"AdTitle" => inline.ad_title = read_text(reader)?,
            b"Impression" => inline.impressions.push(parse_impression(reader, child)?),
            b"Description" => inline.description = Some(read_text(reader)?),
            b"Advertiser" => inline.advertiser = Some(read_text(reader)?),
            b"Error" => inline.error = Some(read_text(reader)?),
            b"Creatives" => inline.creatives = parse_creatives(reader)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(inline)
}

fn parse_wrapper(reader: &mut Reader<&[u8]>) -> Result<Wrapper> {
    let mut wrapper = Wrapper::default();

    read_children(reader, b"Wrapper", |reader, child| {
        match child.name().as_ref() {
            b"AdSystem" => wrapper.ad_system = parse_ad_system(reader, child)?,
            b"VASTAdTagURI" => wrapper.vast_ad_tag_uri = read_text(reader)?,
            b"Impression" => wrapper.impressions.push(parse_impression(reader, child)?),
            b"Error" => wrapper.error = Some(read_text(reader)?),
            b"Creatives" => wrapper.creatives = parse_creatives(reader)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(wrapper)
}

fn parse_ad_system(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<AdSystem> {
    Ok(AdSystem {
        version: attribute(start, b"version"),
        name: read_text(reader)?,
    })
}

fn parse_impression(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Impression> {
    Ok(Impression {
        id: attribute(start, b"id"),
        url: read_text(reader)?,
    })
}

fn parse_creatives(reader: &mut Reader<&[u8]>) -> Result<Vec<Creative>> {
    let mut creatives = Vec::new();

    read_children(reader, b"Creatives", |reader, child| {
        if child.name().as_ref() != b"Creative" {
            return Ok(false);
        }
        creatives.push(parse_creative(reader, child)?);
        Ok(true)
    })?;

    Ok(creatives)
}

fn parse_creative(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Creative> {
    let mut creative = Creative {
        id: attribute(start, b"id"),
        sequence: numeric_attribute(start, b"sequence"),
        ad_id: attribute(start, b"adId").or_else(|| attribute(start, b"AdID")),
        linear: None,
    };

    // CompanionAds and NonLinearAds are skipped
    read_children(reader, b"Creative", |reader, child| {
        if child.name().as_ref() != b"Linear" {
            return Ok(false);
        }
        creative.linear = Some(parse_linear(reader)?);
        Ok(true)
    })?;

    Ok(creative)
}

fn parse_linear(reader: &mut Reader<&[u8]>) -> Result<Linear> {
    let mut linear = Linear::default();

    read_children(reader, b"Linear", |reader, child| {
        match child.name().as_ref() {
            b"Duration" => linear.duration = Some(read_text(reader)?),
            b"MediaFiles" => linear.media_files = parse_media_files(reader)?,
            b"VideoClicks" => linear.video_clicks = Some(parse_video_clicks(reader)?),
            b"TrackingEvents" => linear.tracking_events = parse_tracking_events(reader)?,
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(linear)
}

fn parse_media_files(reader: &mut Reader<&[u8]>) -> Result<Vec<MediaFile>> {
    let mut media_files = Vec::new();

    read_children(reader, b"MediaFiles", |reader, child| {
        if child.name().as_ref() != b"MediaFile" {
            return Ok(false);
        }
        media_files.push(MediaFile {
            mime_type: attribute(child, b"type").unwrap_or_default(),
            bitrate: numeric_attribute(child, b"bitrate"),
            width: numeric_attribute(child, b"width"),
            height: numeric_attribute(child, b"height"),
            delivery: attribute(child, b"delivery"),
            url: read_text(reader)?,
        });
        Ok(true)
    })?;

    Ok(media_files)
}

fn parse_video_clicks(reader: &mut Reader<&[u8]>) -> Result<VideoClicks> {
    let mut video_clicks = VideoClicks::default();

    read_children(reader, b"VideoClicks", |reader, child| {
        match child.name().as_ref() {
            b"ClickThrough" => video_clicks.click_through = Some(read_text(reader)?),
            b"ClickTracking" => video_clicks.click_tracking.push(read_text(reader)?),
            b"CustomClick" => video_clicks.custom_click.push(read_text(reader)?),
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    Ok(video_clicks)
}

fn parse_tracking_events(reader: &mut Reader<&[u8]>) -> Result<Vec<TrackingEvent>> {
    let mut tracking_events = Vec::new();

    read_children(reader, b"TrackingEvents", |reader, child| {
        if child.name().as_ref() != b"Tracking" {
            return Ok(false);
        }
        tracking_events.push(TrackingEvent {
            event: attribute(child, b"event").unwrap_or_default(),
            url: read_text(reader)?,
        });
        Ok(true)
    })?;

    Ok(tracking_events)
}

/// Walk the direct children of `parent` until its end tag.
///
/// `on_child` is called for every child start tag and must consume the child
/// up to and including its end tag, returning `true`. Children it returns
/// `false` for are skipped. Self-closing children carry no content we read
/// and are ignored.
fn read_children<F>(reader: &mut Reader<&[u8]>, parent: &[u8], mut on_child: F) -> Result<()>
where
    F: FnMut(&mut Reader<&[u8]>, &BytesStart) -> Result<bool>,
{
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if !on_child(reader, e)? {
                    skip_element(reader)?;
                }
            }
            Event::End(ref e) if e.name().as_ref() == parent => break,
            Event::Eof => return Err(unexpected_eof()),
            _ => (),
        }
        buf.clear();
    }

    Ok(())
}

/// Read the text content of the element whose start tag was just consumed.
/// Text and CDATA sections are concatenated; nested elements are skipped.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof()),
            _ => (),
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

/// Skip the rest of the element whose start tag was just consumed
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(()),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof()),
            _ => (),
        }
        buf.clear();
    }
}

fn attribute(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.trim().to_string()))
}

fn numeric_attribute(start: &BytesStart, name: &[u8]) -> Option<u32> {
    attribute(start, name)?.parse().ok()
}

fn unexpected_eof() -> VastError {
    VastError::Malformed("unexpected end of file".to_string())
}
