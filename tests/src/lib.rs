#[cfg(test)]
mod fakes;


#[cfg(test)]
mod message_tests;

#[cfg(test)]
mod verifier_tests;
