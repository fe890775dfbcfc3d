/// REST clients for the cloud backend
pub mod firestore;
pub mod google;
