//! Field list and schema declaration for the `zoomph` stream

use serde_json::{Map, Value, json};

/// Stream name every message is tagged with
pub const STREAM: &str = "zoomph";

/// Primary key of a mention row
pub const KEY_PROPERTY: &str = "Id";

/// Fields requested on the poll URL, in request order.
///
/// Names are the upstream's, misspellings included (`FollewerInteractionRate`
/// is requested alongside `FollowerInteractionRate`).
pub const FIELDS: [&str; 72] = [
    "Id",
    "Partner",
    "PartnerMentionType",
    "ServiceType",
    "ServiceId",
    "PartnerExposureCreator",
    "PartnerExposureCreatorName",
    "PartnerExposureDate",
    "Message",
    "ContentType",
    "Url",
    "Verified",
    "FollowerCount",
    "FollewerInteractionRate",
    "Impressions",
    "ProjectedImpressions",
    "RetweetCount",
    "LikeCount",
    "ReplyCount",
    "CommentCount",
    "ViewCount",
    "LoveCount",
    "ShareCount",
    "WowCount",
    "HahaCount",
    "SadCount",
    "AngryCount",
    "AverageConcurrentViewers",
    "IsProrated",
    "AnalyzedProratedSeconds",
    "BrandExposureValue",
    "HoursWatched",
    "VideoTotalSeconds",
    "LogoAverageClarity",
    "LogoAverageSize",
    "LogoStartSeconds",
    "LogoEndSeconds",
    "LogoTotalSeconds",
    "LogoFrameCount",
    "LogoImpressions",
    "Mentions",
    "Hashtags",
    "Engagement",
    "FrameUrl",
    "Language",
    "ProvinceFips",
    "CountryFips",
    "Sentiment",
    "VideoViews",
    "Tags",
    "LogoAI",
    "TextMention",
    "PartnerAssetLabel",
    "AssetAI",
    "LogoOnAssetAI",
    "ExitsCount",
    "TapForwardCount",
    "TapBackwardCount",
    "DislikeCount",
    "Reach",
    "OrganicImpressions",
    "PaidImpressions",
    "EngagementRate",
    "FollowersGained",
    "PeakLiveViewerCount",
    "LiveViews",
    "ProjectedVideoViews",
    "PostValue",
    "Interactions",
    "FollowerInteractionRate",
    "LogoLocation",
    "AllLogos",
];

/// Declared JSON type of every schema property, in declaration order.
const PROPERTIES: [(&str, &str); 68] = [
    ("AllLogos", "array"),
    ("AnalyzedProratedSeconds", "number"),
    ("AngryCount", "number"),
    ("PartnerExposureCreatorName", "string"),
    ("PartnerExposureCreator", "string"),
    ("AverageConcurrentViewers", "number"),
    ("BrandExposureValue", "number"),
    ("CommentCount", "number"),
    ("ContentType", "string"),
    ("CountryFips", "string"),
    ("PartnerExposureDate", "string"),
    ("DislikeCount", "number"),
    ("Engagement", "number"),
    ("EngagementRate", "number"),
    ("ExitsCount", "string"),
    ("FollowerCount", "number"),
    ("FollowersGained", "number"),
    ("FollowerInteractionRate", "string"),
    ("FrameUrl", "string"),
    ("HahaCount", "number"),
    ("Hashtags", "array"),
    ("HoursWatched", "number"),
    ("Id", "number"),
    ("Impressions", "number"),
    ("Interactions", "number"),
    ("IsProrated", "boolean"),
    ("Language", "string"),
    ("LikeCount", "number"),
    ("LiveViews", "number"),
    ("LogoAverageClarity", "number"),
    ("LogoAverageSize", "string"),
    ("LogoEndSeconds", "number"),
    ("LogoFrameCount", "number"),
    ("LogoImpressions", "number"),
    ("LogoLocation", "string"),
    ("LogoStartSeconds", "number"),
    ("LogoTotalSeconds", "number"),
    ("LoveCount", "number"),
    ("Mentions", "array"),
    ("Message", "string"),
    ("Logo AI", "string"),
    ("Text Mention", "string"),
    ("Tags", "string"),
    ("OrganicImpressions", "number"),
    ("PaidImpressions", "number"),
    ("Partner", "string"),
    ("PartnerAssetLabel", "string"),
    ("PartnerMentionType", "string"),
    ("PeakLiveViewerCount", "number"),
    ("PostValue", "number"),
    ("ProjectedImpressions", "number"),
    ("ProjectedVideoViews", "number"),
    ("ProvinceFips", "string"),
    ("Reach", "number"),
    ("ReplyCount", "number"),
    ("RetweetCount", "number"),
    ("SadCount", "number"),
    ("Sentiment", "string"),
    ("ServiceId", "number"),
    ("ServiceType", "string"),
    ("ShareCount", "number"),
    ("Url", "string"),
    ("Verified", "boolean"),
    ("VideoTotalSeconds", "number"),
    ("VideoViews", "number"),
    ("ViewCount", "number"),
    ("VODViews", "number"),
    ("WowCount", "number"),
];

/// Static schema declared once before any record.
///
/// Not derived from [`FIELDS`] or from row contents; downstream loaders
/// key their tables on it as-is. `Id` carries the key marker and
/// `PartnerExposureDate` the date-time format.
pub fn schema() -> Value {
    let properties: Map<String, Value> = PROPERTIES
        .iter()
        .map(|&(name, ty)| {
            let mut property = json!({"type": ty});
            match name {
                KEY_PROPERTY => property["key"] = Value::Bool(true),
                "PartnerExposureDate" => property["format"] = json!("date-time"),
                _ => {}
            }
            (name.to_string(), property)
        })
        .collect();
    json!({"type": "object", "properties": properties})
}
