use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::coerce::{amount, text, timestamp};
use crate::mirror::models::{CellValue, ColumnSpec, MirrorRecord};

/// Raw CRM object properties. HubSpot sends unset properties as `null`.
pub type Properties = HashMap<String, Option<String>>;

/// Natural key shared by every CRM table.
const OBJECT_ID: ColumnSpec = ColumnSpec::varchar("hs_object_id", 50);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    pub hs_object_id: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub createdate: Option<DateTime<Utc>>,
    pub lastmodifieddate: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            hs_object_id: text(props, "hs_object_id"),
            firstname: text(props, "firstname"),
            lastname: text(props, "lastname"),
            email: text(props, "email"),
            phone: text(props, "phone"),
            createdate: timestamp(props, "createdate"),
            lastmodifieddate: timestamp(props, "lastmodifieddate"),
        }
    }
}

impl MirrorRecord for Contact {
    const TABLE: &'static str = "contacts";
    const KEY: ColumnSpec = OBJECT_ID;
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::varchar("firstname", 255),
        ColumnSpec::varchar("lastname", 255),
        ColumnSpec::varchar("email", 255),
        ColumnSpec::varchar("phone", 50),
        ColumnSpec::timestamp("createdate"),
        ColumnSpec::timestamp("lastmodifieddate"),
    ];

    fn natural_key(&self) -> Option<&str> {
        self.hs_object_id.as_deref()
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.firstname.clone().into(),
            self.lastname.clone().into(),
            self.email.clone().into(),
            self.phone.clone().into(),
            self.createdate.into(),
            self.lastmodifieddate.into(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deal {
    pub hs_object_id: Option<String>,
    pub dealname: Option<String>,
    pub dealstage: Option<String>,
    pub pipeline: Option<String>,
    pub amount: Option<Decimal>,
    pub closedate: Option<DateTime<Utc>>,
    pub createdate: Option<DateTime<Utc>>,
    pub lastmodifieddate: Option<DateTime<Utc>>,
}

impl Deal {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            hs_object_id: text(props, "hs_object_id"),
            dealname: text(props, "dealname"),
            dealstage: text(props, "dealstage"),
            pipeline: text(props, "pipeline"),
            amount: amount(props, "amount"),
            closedate: timestamp(props, "closedate"),
            createdate: timestamp(props, "createdate"),
            lastmodifieddate: timestamp(props, "lastmodifieddate"),
        }
    }
}

impl MirrorRecord for Deal {
    const TABLE: &'static str = "deals";
    const KEY: ColumnSpec = OBJECT_ID;
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::varchar("dealname", 255),
        ColumnSpec::varchar("dealstage", 100),
        ColumnSpec::varchar("pipeline", 100),
        ColumnSpec::amount("amount"),
        ColumnSpec::timestamp("closedate"),
        ColumnSpec::timestamp("createdate"),
        ColumnSpec::timestamp("lastmodifieddate"),
    ];

    fn natural_key(&self) -> Option<&str> {
        self.hs_object_id.as_deref()
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.dealname.clone().into(),
            self.dealstage.clone().into(),
            self.pipeline.clone().into(),
            self.amount.into(),
            self.closedate.into(),
            self.createdate.into(),
            self.lastmodifieddate.into(),
        ]
    }
}

/// A contact whose lifecycle stage is `lead`, mirrored into its own table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lead {
    pub hs_object_id: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lifecyclestage: Option<String>,
    pub createdate: Option<DateTime<Utc>>,
    pub lastmodifieddate: Option<DateTime<Utc>>,
}

impl Lead {
    pub const LIFECYCLE_STAGE: &'static str = "lead";

    pub fn from_properties(props: &Properties) -> Self {
        Self {
            hs_object_id: text(props, "hs_object_id"),
            firstname: text(props, "firstname"),
            lastname: text(props, "lastname"),
            email: text(props, "email"),
            phone: text(props, "phone"),
            lifecyclestage: text(props, "lifecyclestage"),
            createdate: timestamp(props, "createdate"),
            lastmodifieddate: timestamp(props, "lastmodifieddate"),
        }
    }

    /// Whether a contact's properties put it in the lead stage.
    pub fn is_lead(props: &Properties) -> bool {
        text(props, "lifecyclestage").as_deref() == Some(Self::LIFECYCLE_STAGE)
    }
}

impl MirrorRecord for Lead {
    const TABLE: &'static str = "leads";
    const KEY: ColumnSpec = OBJECT_ID;
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::varchar("firstname", 255),
        ColumnSpec::varchar("lastname", 255),
        ColumnSpec::varchar("email", 255),
        ColumnSpec::varchar("phone", 50),
        ColumnSpec::varchar("lifecyclestage", 50),
        ColumnSpec::timestamp("createdate"),
        ColumnSpec::timestamp("lastmodifieddate"),
    ];

    fn natural_key(&self) -> Option<&str> {
        self.hs_object_id.as_deref()
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.firstname.clone().into(),
            self.lastname.clone().into(),
            self.email.clone().into(),
            self.phone.clone().into(),
            self.lifecyclestage.clone().into(),
            self.createdate.into(),
            self.lastmodifieddate.into(),
        ]
    }
}

/// An email engagement (`emails` object).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Engagement {
    pub hs_object_id: Option<String>,
    pub hs_email_direction: Option<String>,
    pub hs_timestamp: Option<DateTime<Utc>>,
    pub hs_from_email: Option<String>,
    pub hs_to_email: Option<String>,
    pub hs_subject: Option<String>,
}

impl Engagement {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            hs_object_id: text(props, "hs_object_id"),
            hs_email_direction: text(props, "hs_email_direction"),
            hs_timestamp: timestamp(props, "hs_timestamp"),
            hs_from_email: text(props, "hs_from_email"),
            hs_to_email: text(props, "hs_to_email"),
            hs_subject: text(props, "hs_subject"),
        }
    }
}

impl MirrorRecord for Engagement {
    const TABLE: &'static str = "engagements";
    const KEY: ColumnSpec = OBJECT_ID;
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::varchar("hs_email_direction", 20),
        ColumnSpec::timestamp("hs_timestamp"),
        ColumnSpec::varchar("hs_from_email", 255),
        ColumnSpec::varchar("hs_to_email", 255),
        ColumnSpec::text("hs_subject"),
    ];

    fn natural_key(&self) -> Option<&str> {
        self.hs_object_id.as_deref()
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.hs_email_direction.clone().into(),
            self.hs_timestamp.into(),
            self.hs_from_email.clone().into(),
            self.hs_to_email.clone().into(),
            self.hs_subject.clone().into(),
        ]
    }
}
