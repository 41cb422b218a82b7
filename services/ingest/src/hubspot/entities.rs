use serde::Serialize;

use crmsync_db::crm::{Contact, Deal, Engagement, Lead};
use crmsync_db::mirror::MirrorRecord;

use super::models::HubSpotObject;
use crate::fetcher::{FetchPlan, ListFilter};

/// A CRM object kind that can be fetched from HubSpot and mirrored.
pub trait HubSpotEntity: MirrorRecord + Serialize + Send + Sync + Sized {
    /// Name used in logs and results.
    const NAME: &'static str;
    const OBJECT_TYPE: &'static str;
    const PROPERTIES: &'static [&'static str];
    const FILTER_PROPERTIES: &'static [&'static str] = &[];
    const FILTER: Option<ListFilter> = None;

    fn from_object(object: &HubSpotObject) -> Self;

    fn plan() -> FetchPlan<'static> {
        FetchPlan {
            object_type: Self::OBJECT_TYPE,
            properties: Self::PROPERTIES,
            filter_properties: Self::FILTER_PROPERTIES,
            filter: Self::FILTER,
        }
    }
}

impl HubSpotEntity for Contact {
    const NAME: &'static str = "contacts";
    const OBJECT_TYPE: &'static str = "contacts";
    const PROPERTIES: &'static [&'static str] = &[
        "hs_object_id",
        "firstname",
        "lastname",
        "email",
        "phone",
        "createdate",
        "lastmodifieddate",
    ];

    fn from_object(object: &HubSpotObject) -> Self {
        Contact::from_properties(&object.properties)
    }
}

impl HubSpotEntity for Deal {
    const NAME: &'static str = "deals";
    const OBJECT_TYPE: &'static str = "deals";
    const PROPERTIES: &'static [&'static str] = &[
        "hs_object_id",
        "dealname",
        "dealstage",
        "pipeline",
        "amount",
        "closedate",
        "createdate",
        "lastmodifieddate",
    ];

    fn from_object(object: &HubSpotObject) -> Self {
        Deal::from_properties(&object.properties)
    }
}

impl HubSpotEntity for Lead {
    const NAME: &'static str = "leads";
    const OBJECT_TYPE: &'static str = "contacts";
    const PROPERTIES: &'static [&'static str] = &[
        "hs_object_id",
        "firstname",
        "lastname",
        "email",
        "phone",
        "lifecyclestage",
        "createdate",
        "lastmodifieddate",
    ];
    const FILTER_PROPERTIES: &'static [&'static str] = &["lifecyclestage"];
    const FILTER: Option<ListFilter> = Some(Lead::is_lead);

    fn from_object(object: &HubSpotObject) -> Self {
        Lead::from_properties(&object.properties)
    }
}

impl HubSpotEntity for Engagement {
    const NAME: &'static str = "engagements";
    const OBJECT_TYPE: &'static str = "emails";
    const PROPERTIES: &'static [&'static str] = &[
        "hs_object_id",
        "hs_email_direction",
        "hs_timestamp",
        "hs_from_email",
        "hs_to_email",
        "hs_subject",
    ];

    fn from_object(object: &HubSpotObject) -> Self {
        Engagement::from_properties(&object.properties)
    }
}
