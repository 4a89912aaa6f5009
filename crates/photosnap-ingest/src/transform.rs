//! Raw Flickr payloads to persisted [`Entry`] records
//!
//! Pure: no IO, no failure. Missing fields in the payload have already decoded to
//! empty strings, so every output field is always populated.

use crate::flickr::models::{Location, Owner, PhotoInfo, PhotoSizes, Urls};
use photosnap_common::Entry;

/// Icon shown for accounts without a custom buddy icon
pub const DEFAULT_BUDDY_ICON: &str = "https://www.flickr.com/images/buddyicon.gif";

/// Owner photostream prefix used when a photo lists no page URL
pub const PROFILE_URL_PREFIX: &str = "https://flickr.com/photos/";

/// `iconserver` value meaning "no custom icon"
const NO_ICON_SERVER: &str = "0";

/// Flatten the getInfo and getSizes payloads for `photo_id` into one record
pub fn transform(photo_id: &str, info: &PhotoInfo, sizes: PhotoSizes) -> Entry {
    let location = &info.location;

    Entry {
        id: photo_id.to_string(),
        sizes: sizes.size,
        owner_username: info.owner.username.clone(),
        owner_icon: owner_icon(&info.owner),
        title: info.title.content.clone(),
        description: info.description.content.clone(),
        date_taken: info.dates.taken.clone(),
        latitude: location.latitude.clone(),
        longitude: location.longitude.clone(),
        location_accuracy: location.accuracy.clone(),
        location_description: location_description(location),
        webpage: webpage(&info.urls, &info.owner),
    }
}

/// Buddy icon URL per Flickr's addressing scheme, or the default icon
pub fn owner_icon(owner: &Owner) -> String {
    if owner.iconserver == NO_ICON_SERVER {
        return DEFAULT_BUDDY_ICON.to_string();
    }

    format!(
        "https://farm{}.staticflickr.com/{}/buddyicons/{}.jpg",
        owner.iconfarm, owner.iconserver, owner.nsid
    )
}

/// Place names from neighbourhood up to country, empty ones dropped
pub fn location_description(location: &Location) -> String {
    [
        &location.neighbourhood,
        &location.locality,
        &location.county,
        &location.region,
        &location.country,
    ]
    .iter()
    .map(|segment| segment.content.as_str())
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// First listed page URL verbatim, else the owner's photostream
pub fn webpage(urls: &Urls, owner: &Owner) -> String {
    match urls.url.first() {
        Some(url) => url.content.clone(),
        None => format!("{}{}", PROFILE_URL_PREFIX, owner.nsid),
    }
}
