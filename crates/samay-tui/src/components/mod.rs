pub mod dataset_panel;
pub mod docs_panel;
pub mod forecast_panel;
pub mod header;
pub mod help_overlay;
pub mod model_list;
pub mod plot_dialog;
