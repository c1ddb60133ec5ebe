pub mod citation_controller;
pub mod collaboration_controller;
pub mod data_controller;
pub mod literature_controller;
pub mod proposal_controller;
pub mod system_controller;
