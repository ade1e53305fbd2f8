//! UI components module
//!
//! Each component draws one surface of the flow from a state snapshot and queues
//! `UiAction`s on `UiState`; none of them talks to the controller directly.

pub mod auth_panel;
pub mod header;
pub mod image_upload;
pub mod loading_panel;
pub mod mode_picker;
pub mod podcast_controls;
pub mod questionnaire;
pub mod results_view;
pub mod style_picker;

pub use auth_panel::AuthPanel;
pub use header::Header;
pub use image_upload::ImageUpload;
pub use loading_panel::LoadingPanel;
pub use mode_picker::ModePicker;
pub use podcast_controls::PodcastControls;
pub use questionnaire::Questionnaire;
pub use results_view::ResultsView;
pub use style_picker::StylePicker;

/// Attach an AccessKit label to a response
pub(crate) fn label_widget(
    response: &egui::Response,
    kind: egui::WidgetType,
    enabled: bool,
    label: &str,
) {
    response.widget_info(|| egui::WidgetInfo::labeled(kind, enabled, label));
}
