pub mod stage1_train;
pub mod stage2_label;
pub mod stage3_context;
pub mod stage4_classify;
pub mod stage5_report;
