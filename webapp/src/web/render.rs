//! Static HTML builders for the web front-end.

use medviscore::narrative::Language;

use crate::web::session::AnalysisRecord;

/// Form and page captions for one language.
pub struct Labels {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub upload_text: &'static str,
    pub upload_help: &'static str,
    pub patient_info: &'static str,
    pub name: &'static str,
    pub age: &'static str,
    pub gender: &'static str,
    pub village: &'static str,
    pub district: &'static str,
    pub state: &'static str,
    pub phone: &'static str,
    pub address: &'static str,
    pub emergency_contact: &'static str,
    pub analyze: &'static str,
    pub save_report: &'static str,
    pub select_language: &'static str,
    pub analysis_results: &'static str,
    pub patient_history: &'static str,
    pub no_history: &'static str,
    pub new_analysis: &'static str,
    pub previous_analyses: &'static str,
    pub error: &'static str,
}

const EN: Labels = Labels {
    title: "Medical Vision Diagnostic Tool",
    subtitle: "AI-Powered Medical Image Analysis",
    upload_text: "Upload Medical Image",
    upload_help: "Supported formats: JPG, JPEG, PNG, BMP",
    patient_info: "Patient Information",
    name: "Patient Name",
    age: "Age",
    gender: "Gender",
    village: "Village",
    district: "District",
    state: "State",
    phone: "Phone Number",
    address: "Address",
    emergency_contact: "Emergency Contact",
    analyze: "Analyze Image",
    save_report: "Save Report",
    select_language: "Select Language",
    analysis_results: "Analysis Results",
    patient_history: "Patient History",
    no_history: "No previous records found",
    new_analysis: "New Analysis",
    previous_analyses: "Previous Analyses",
    error: "Error",
};

const HI: Labels = Labels {
    title: "चिकित्सा दृष्टि नैदानिक उपकरण",
    subtitle: "एआई-संचालित चिकित्सा छवि विश्लेषण",
    upload_text: "चिकित्सा छवि अपलोड करें",
    upload_help: "समर्थित प्रारूप: JPG, JPEG, PNG, BMP",
    patient_info: "रोगी की जानकारी",
    name: "रोगी का नाम",
    age: "आयु",
    gender: "लिंग",
    village: "गाँव",
    district: "जिला",
    state: "राज्य",
    phone: "फोन नंबर",
    address: "पता",
    emergency_contact: "आपातकालीन संपर्क",
    analyze: "छवि का विश्लेषण करें",
    save_report: "रिपोर्ट सहेजें",
    select_language: "भाषा चुनें",
    analysis_results: "विश्लेषण परिणाम",
    patient_history: "रोगी का इतिहास",
    no_history: "कोई पिछला रिकॉर्ड नहीं मिला",
    new_analysis: "नया विश्लेषण",
    previous_analyses: "पिछले विश्लेषण",
    error: "त्रुटि",
};

const TA: Labels = Labels {
    title: "மருத்துவ பார்வை நோயறிதல் கருவி",
    subtitle: "ஏஐ-ஆதாரமான மருத்துவ படக்காட்சிகள் பகுப்பாய்வு",
    upload_text: "மருத்துவப் படம் பதிவேற்றவும்",
    upload_help: "ஆதரிக்கப்படும் வடிவங்கள்: JPG, JPEG, PNG, BMP",
    patient_info: "நோயாளியின் தகவல்கள்",
    name: "நோயாளியின் பெயர்",
    age: "வயது",
    gender: "பாலினம்",
    village: "கிராமம்",
    district: "மாவட்டம்",
    state: "மாநிலம்",
    phone: "தொலைபேசி எண்",
    address: "முகவரி",
    emergency_contact: "அவசர தொடர்பு",
    analyze: "படத்தை பகுப்பாய்வு செய்யவும்",
    save_report: "அறிக்கையை சேமிக்கவும்",
    select_language: "மொழியைத் தேர்ந்தெடுக்கவும்",
    analysis_results: "பகுப்பாய்வு முடிவுகள்",
    patient_history: "நோயாளியின் வரலாறு",
    no_history: "முந்தைய பதிவுகள் கிடைக்கவில்லை",
    new_analysis: "புதிய பகுப்பாய்வு",
    previous_analyses: "முந்தைய பகுப்பாய்வுகள்",
    error: "பிழை",
};

pub fn labels(language: Language) -> &'static Labels {
    match language {
        Language::English => &EN,
        Language::Hindi => &HI,
        Language::Tamil => &TA,
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn page(title: &str, body: String) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\">\
         <title>{title}</title>\
         <style>body{{font-family:sans-serif;margin:2em;max-width:60em}}\
         label{{display:block;margin-top:0.6em}}\
         input,select,textarea{{width:100%;max-width:24em}}\
         pre{{background:#f4f4f4;padding:1em;white-space:pre-wrap}}\
         .actions{{margin-top:1em}}</style>\
         </head><body>{body}</body></html>"
    )
}

fn language_selector(current: Language) -> String {
    Language::ALL
        .iter()
        .map(|language| {
            let selected = if *language == current { " selected" } else { "" };
            format!(
                "<option value=\"{}\"{}>{}</option>",
                language.code(),
                selected,
                language
            )
        })
        .collect()
}

/// Intake form plus upload control.
pub fn form_page(language: Language) -> String {
    let t = labels(language);
    let body = format!(
        "<h1>{title}</h1><h3>{subtitle}</h3>\
         <p><a href=\"/history?lang={code}\">{previous}</a></p>\
         <form method=\"post\" action=\"/analyze\" enctype=\"multipart/form-data\">\
         <label>{select_language}\
         <select name=\"language\">{selector}</select></label>\
         <h2>{patient_info}</h2>\
         <label>{name}<input name=\"patient_name\"></label>\
         <label>{age}<input name=\"age\" type=\"number\" min=\"1\" max=\"120\"></label>\
         <label>{gender}<input name=\"gender\"></label>\
         <label>{village}<input name=\"village\"></label>\
         <label>{district}<input name=\"district\"></label>\
         <label>{state}<input name=\"state\"></label>\
         <label>{phone}<input name=\"phone\"></label>\
         <label>{address}<textarea name=\"address\"></textarea></label>\
         <h3>{emergency}</h3>\
         <label>{phone}<input name=\"emergency_phone\"></label>\
         <h2>{upload}</h2><p>{upload_help}</p>\
         <input type=\"file\" name=\"image\" accept=\".jpg,.jpeg,.png,.bmp\" required>\
         <div class=\"actions\"><button type=\"submit\">{analyze}</button></div>\
         </form>",
        title = t.title,
        subtitle = t.subtitle,
        code = language.code(),
        previous = t.previous_analyses,
        select_language = t.select_language,
        selector = language_selector(language),
        patient_info = t.patient_info,
        name = t.name,
        age = t.age,
        gender = t.gender,
        village = t.village,
        district = t.district,
        state = t.state,
        phone = t.phone,
        address = t.address,
        emergency = t.emergency_contact,
        upload = t.upload_text,
        upload_help = t.upload_help,
        analyze = t.analyze,
    );
    page(t.title, body)
}

/// Completed analysis with a download link for the stored report.
pub fn report_page(language: Language, source_name: &str, report: &str, index: usize) -> String {
    let t = labels(language);
    let body = format!(
        "<h1>{results}</h1>\
         <p>{source}</p>\
         <pre>{report}</pre>\
         <div class=\"actions\">\
         <a href=\"/report/{index}/download\">{save}</a> | \
         <a href=\"/?lang={code}\">{new_analysis}</a> | \
         <a href=\"/history?lang={code}\">{previous}</a>\
         </div>",
        results = t.analysis_results,
        source = escape(source_name),
        report = escape(report),
        index = index,
        save = t.save_report,
        code = language.code(),
        new_analysis = t.new_analysis,
        previous = t.previous_analyses,
    );
    page(t.analysis_results, body)
}

pub fn history_page(language: Language, records: &[(usize, AnalysisRecord)]) -> String {
    let t = labels(language);
    let entries = if records.is_empty() {
        format!("<p>{}</p>", t.no_history)
    } else {
        records
            .iter()
            .map(|(index, record)| {
                format!(
                    "<details><summary>{} - {}</summary><pre>{}</pre>\
                     <a href=\"/report/{}/download\">{}</a></details>",
                    escape(&record.timestamp),
                    escape(&record.patient.name),
                    escape(&record.report),
                    index,
                    t.save_report,
                )
            })
            .collect()
    };
    let body = format!(
        "<h1>{history}</h1>{entries}\
         <div class=\"actions\"><a href=\"/?lang={code}\">{new_analysis}</a></div>",
        history = t.patient_history,
        entries = entries,
        code = language.code(),
        new_analysis = t.new_analysis,
    );
    page(t.patient_history, body)
}

pub fn error_page(language: Language, message: &str) -> String {
    let t = labels(language);
    let body = format!(
        "<h1>{error}</h1><pre>{message}</pre>\
         <div class=\"actions\"><a href=\"/?lang={code}\">{new_analysis}</a></div>",
        error = t.error,
        message = escape(message),
        code = language.code(),
        new_analysis = t.new_analysis,
    );
    page(t.error, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_page_localizes_captions() {
        let english = form_page(Language::English);
        assert!(english.contains("Patient Information"));
        let hindi = form_page(Language::Hindi);
        assert!(hindi.contains("रोगी की जानकारी"));
        let tamil = form_page(Language::Tamil);
        assert!(tamil.contains("நோயாளியின் தகவல்கள்"));
    }

    #[test]
    fn report_page_escapes_markup() {
        let html = report_page(Language::English, "scan.jpg", "a <b> c", 0);
        assert!(html.contains("a &lt;b&gt; c"));
        assert!(html.contains("/report/0/download"));
    }
}
