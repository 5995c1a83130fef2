use crate::error::{AdError, Result};
use crate::models::*;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::str::from_utf8;

/// Parse a VAST XML string into an AdResponse
pub fn parse_response(xml: &str) -> Result<AdResponse> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut response = AdResponse {
        version: String::new(),
        ads: Vec::new(),
        error: None,
    };
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"VAST" => {
                saw_root = true;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"version" {
                        if let Ok(value) = from_utf8(&attr.value) {
                            response.version = value.to_string();
                        }
                    }
                }

                if response.version.is_empty() {
                    return Err(AdError::Configuration(
                        "VAST document has no version attribute".to_string(),
                    ));
                }

                response.ads = parse_ads(&mut reader)?;
                break;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    if !saw_root {
        return Err(AdError::Configuration(
            "document has no VAST root element".to_string(),
        ));
    }

    Ok(response)
}

/// Parse Ad elements up to the closing VAST tag
fn parse_ads(reader: &mut Reader<&[u8]>) -> Result<Vec<Ad>> {
    let mut ads = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Ad" => {
                ads.push(parse_ad_element(reader, e)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"VAST" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(ads)
}

/// Parse a single Ad element
fn parse_ad_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Ad> {
    let mut ad = Ad {
        id: None,
        sequence: None,
        inline: None,
        wrapper: None,
    };

    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    ad.id = Some(value.to_string());
                }
            }
            b"sequence" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(seq) = value.parse::<u32>() {
                        ad.sequence = Some(seq);
                    }
                }
            }
            _ => (),
        }
    }

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"InLine" => {
                    ad.inline = Some(parse_inline_element(reader)?);
                }
                b"Wrapper" => {
                    ad.wrapper = Some(parse_wrapper_element(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Ad" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(ad)
}

/// Parse an InLine element
fn parse_inline_element(reader: &mut Reader<&[u8]>) -> Result<InlineAd> {
    let mut inline = InlineAd {
        ad_system: AdSystem {
            name: String::new(),
            version: None,
        },
        ad_title: String::new(),
        impressions: Vec::new(),
        error: None,
        creatives: Vec::new(),
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"AdSystem" => {
                    inline.ad_system = parse_ad_system(reader, e)?;
                }
                b"AdTitle" => {
                    inline.ad_title = read_text_element(reader)?;
                }
                b"Impression" => {
                    inline.impressions.push(parse_impression(reader, e)?);
                }
                b"Error" => {
                    inline.error = Some(read_text_element(reader)?);
                }
                b"Creatives" => {
                    inline.creatives = parse_creatives(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"InLine" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(inline)
}

/// Parse a Wrapper element
fn parse_wrapper_element(reader: &mut Reader<&[u8]>) -> Result<Wrapper> {
    let mut wrapper = Wrapper {
        ad_system: AdSystem {
            name: String::new(),
            version: None,
        },
        vast_ad_tag_uri: String::new(),
        impressions: Vec::new(),
        error: None,
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"AdSystem" => {
                    wrapper.ad_system = parse_ad_system(reader, e)?;
                }
                b"VASTAdTagURI" => {
                    wrapper.vast_ad_tag_uri = read_text_element(reader)?;
                }
                b"Impression" => {
                    wrapper.impressions.push(parse_impression(reader, e)?);
                }
                b"Error" => {
                    wrapper.error = Some(read_text_element(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Wrapper" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(wrapper)
}

/// Read the text content of an XML element
fn read_text_element(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => {
                text = e.unescape()?.into_owned();
            }
            Ok(Event::CData(e)) => {
                if let Ok(value) = from_utf8(&e) {
                    text = value.to_string();
                }
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(text.trim().to_string())
}

/// Skip an XML element and all its children
fn skip_element(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(_)) => {
                depth += 1;
            }
            Ok(Event::End(ref e)) => {
                if depth == 0 && e.name().as_ref() == name {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(())
}

/// Parse an AdSystem element
fn parse_ad_system(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<AdSystem> {
    let mut ad_system = AdSystem {
        name: String::new(),
        version: None,
    };

    for attr in start.attributes().flatten() {
        if attr.key.as_ref() == b"version" {
            if let Ok(value) = from_utf8(&attr.value) {
                ad_system.version = Some(value.to_string());
            }
        }
    }

    ad_system.name = read_text_element(reader)?;

    Ok(ad_system)
}

/// Parse an Impression element
fn parse_impression(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Impression> {
    let mut impression = Impression {
        id: None,
        url: String::new(),
    };

    for attr in start.attributes().flatten() {
        if attr.key.as_ref() == b"id" {
            if let Ok(value) = from_utf8(&attr.value) {
                impression.id = Some(value.to_string());
            }
        }
    }

    impression.url = read_text_element(reader)?;

    Ok(impression)
}

/// Parse a Creatives element
fn parse_creatives(reader: &mut Reader<&[u8]>) -> Result<Vec<Creative>> {
    let mut creatives = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Creative" => {
                creatives.push(parse_creative(reader, e)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Creatives" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(creatives)
}

/// Parse a Creative element; NonLinearAds and other payloads are skipped
fn parse_creative(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Creative> {
    let mut creative = Creative {
        id: None,
        sequence: None,
        api_framework: None,
        linear: None,
        companion_ads: None,
    };

    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    creative.id = Some(value.to_string());
                }
            }
            b"sequence" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(seq) = value.parse::<u32>() {
                        creative.sequence = Some(seq);
                    }
                }
            }
            b"apiFramework" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    creative.api_framework = Some(value.to_string());
                }
            }
            _ => (),
        }
    }

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Linear" => {
                    creative.linear = Some(parse_linear(reader)?);
                }
                b"CompanionAds" => {
                    creative.companion_ads = Some(parse_companion_ads(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Creative" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(creative)
}

/// Parse a Linear element
fn parse_linear(reader: &mut Reader<&[u8]>) -> Result<Linear> {
    let mut linear = Linear {
        duration: None,
        media_files: Vec::new(),
        video_clicks: None,
        tracking_events: Vec::new(),
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Duration" => {
                    linear.duration = Some(read_text_element(reader)?);
                }
                b"MediaFiles" => {
                    linear.media_files = parse_media_files(reader)?;
                }
                b"VideoClicks" => {
                    linear.video_clicks = Some(parse_video_clicks(reader)?);
                }
                b"TrackingEvents" => {
                    linear.tracking_events = parse_tracking_events(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Linear" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(linear)
}

/// Parse a MediaFiles element
fn parse_media_files(reader: &mut Reader<&[u8]>) -> Result<Vec<MediaFile>> {
    let mut media_files = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"MediaFile" => {
                media_files.push(parse_media_file(reader, e)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"MediaFiles" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(media_files)
}

/// Parse a MediaFile element
fn parse_media_file(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<MediaFile> {
    let mut media_file = MediaFile {
        url: String::new(),
        mime_type: String::new(),
        api_framework: None,
        bitrate: None,
        width: None,
        height: None,
        delivery: None,
    };

    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"type" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    media_file.mime_type = value.to_string();
                }
            }
            b"apiFramework" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    media_file.api_framework = Some(value.to_string());
                }
            }
            b"bitrate" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(bitrate) = value.parse::<u32>() {
                        media_file.bitrate = Some(bitrate);
                    }
                }
            }
            b"width" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(width) = value.parse::<u32>() {
                        media_file.width = Some(width);
                    }
                }
            }
            b"height" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(height) = value.parse::<u32>() {
                        media_file.height = Some(height);
                    }
                }
            }
            b"delivery" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    media_file.delivery = Some(value.to_string());
                }
            }
            _ => (),
        }
    }

    media_file.url = read_text_element(reader)?;

    Ok(media_file)
}

/// Parse a VideoClicks element
fn parse_video_clicks(reader: &mut Reader<&[u8]>) -> Result<VideoClicks> {
    let mut video_clicks = VideoClicks {
        click_through: None,
        click_tracking: Vec::new(),
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"ClickThrough" => {
                    video_clicks.click_through = Some(read_text_element(reader)?);
                }
                b"ClickTracking" => {
                    video_clicks.click_tracking.push(read_text_element(reader)?);
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"VideoClicks" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(video_clicks)
}

/// Parse a TrackingEvents element
fn parse_tracking_events(reader: &mut Reader<&[u8]>) -> Result<Vec<TrackingEvent>> {
    let mut tracking_events = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Tracking" => {
                let mut event = String::new();
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"event" {
                        if let Ok(value) = from_utf8(&attr.value) {
                            event = value.to_string();
                        }
                    }
                }
                let url = read_text_element(reader)?;
                tracking_events.push(TrackingEvent { event, url });
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"TrackingEvents" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(tracking_events)
}

/// Parse a CompanionAds element
fn parse_companion_ads(reader: &mut Reader<&[u8]>) -> Result<CompanionAds> {
    let mut companion_ads = CompanionAds {
        companions: Vec::new(),
    };

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Companion" => {
                companion_ads.companions.push(parse_companion(reader, e)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"CompanionAds" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(companion_ads)
}

/// Parse a Companion element
fn parse_companion(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Companion> {
    let mut companion = Companion {
        id: None,
        width: 0,
        height: 0,
        static_resource: None,
        creative_type: None,
        click_through: None,
        tracking_events: Vec::new(),
    };

    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"id" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    companion.id = Some(value.to_string());
                }
            }
            b"width" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(width) = value.parse::<u32>() {
                        companion.width = width;
                    }
                }
            }
            b"height" => {
                if let Ok(value) = from_utf8(&attr.value) {
                    if let Ok(height) = value.parse::<u32>() {
                        companion.height = height;
                    }
                }
            }
            _ => (),
        }
    }

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"StaticResource" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"creativeType" {
                            if let Ok(value) = from_utf8(&attr.value) {
                                companion.creative_type = Some(value.to_string());
                            }
                        }
                    }
                    companion.static_resource = Some(read_text_element(reader)?);
                }
                b"CompanionClickThrough" => {
                    companion.click_through = Some(read_text_element(reader)?);
                }
                b"TrackingEvents" => {
                    companion.tracking_events = parse_tracking_events(reader)?;
                }
                _ => {
                    skip_element(reader, e.name().as_ref())?;
                }
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Companion" => break,
            Ok(Event::Eof) => {
                return Err(AdError::Fetch("unexpected end of document".to_string()));
            }
            Err(e) => return Err(AdError::XmlParseError(e)),
            _ => (),
        }
        buf.clear();
    }

    Ok(companion)
}
