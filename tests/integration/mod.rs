mod helpers;
mod test_channel;
mod test_lock;
mod test_quality;
mod test_release;
