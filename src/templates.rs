use askama::Template;

use crate::search::SearchEntry;
use crate::types::StakeholderRecord;

/// The standalone map page. Only pre-rendered fragments and the escaped
/// data document are marked `safe` in the template.
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub stylesheets: Vec<&'static str>,
    pub scripts: Vec<&'static str>,
    pub widget: String,
    pub data: String,
    pub app_script: &'static str,
}

#[derive(Template)]
#[template(path = "search_widget.html")]
pub struct SearchWidgetTemplate<'a> {
    pub dropdown: bool,
    pub placeholder: &'a str,
    pub entries: &'a [SearchEntry],
}

#[derive(Template)]
#[template(path = "popup.html")]
pub struct PopupTemplate<'a> {
    pub rows: [(&'static str, &'a str); 8],
}

impl<'a> PopupTemplate<'a> {
    pub fn for_record(record: &'a StakeholderRecord) -> Self {
        Self {
            rows: [
                ("Company", &record.company_name),
                ("Category", &record.category),
                ("Commodity", &record.commodity),
                ("Office Address", &record.office_address),
                ("Contact Person", &record.contact_person),
                ("Phone", &record.phone),
                ("Designation", &record.designation),
                ("Email/Website", &record.contact),
            ],
        }
    }
}
